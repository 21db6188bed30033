//! Coerciones de `serde_json::Value` usadas por reglas y condicionales.
use serde_json::Value;

/// Número finito a partir de un número JSON o de un string numérico.
/// Booleanos, null, arrays y objetos no son números.
pub fn to_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Representación textual de un escalar; `None` para arrays/objetos.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Ausente o vacío a efectos de `required`.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(arr) => arr.is_empty(),
        Value::Object(obj) => obj.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Igualdad laxa: `5 == "5"`, `true == "true"`, `1 == 1.0`.
pub fn loose_equal(value: &Value, target: &Value) -> bool {
    if value == target {
        return true;
    }
    match (value, target) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(_), Value::Number(_)) | (Value::Number(_), Value::String(_)) => {
            matches!((to_f64(value), to_f64(target)), (Some(a), Some(b)) if a == b)
        }
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            match s.trim().to_ascii_lowercase().as_str() {
                "true" => *b,
                "false" => !*b,
                _ => false,
            }
        }
        _ => false,
    }
}

/// `includes`: substring en strings, pertenencia (laxa) en arrays.
pub fn includes(value: &Value, target: &Value) -> bool {
    match value {
        Value::Array(arr) => arr.iter().any(|item| loose_equal(item, target)),
        Value::String(s) => to_text(target).is_some_and(|t| s.contains(t.as_str())),
        _ => false,
    }
}

/// Comparación numérica; falsa si alguno de los lados no es número.
pub fn compare_numeric(value: &Value, target: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (to_f64(value), to_f64(target)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}
