//! Hash helpers – abstracción para poder cambiar de algoritmo sin tocar el
//! resto del core.

use blake3::Hasher;
use form_domain::Field;
use serde_json::{json, Value};

use crate::constants::FINGERPRINT_VERSION;
use crate::hashing::to_canonical_json;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hash de la forma canónica de un JSON.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

/// Huella de un esquema: versión de formato + campos en orden. `None` sólo si
/// los campos no se pueden representar como JSON.
pub fn schema_fingerprint(fields: &[Field]) -> Option<String> {
    let fields = serde_json::to_value(fields).ok()?;
    Some(hash_value(&json!({ "version": FINGERPRINT_VERSION, "fields": fields })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_domain::FieldType;

    #[test]
    fn fingerprint_changes_with_fields() {
        let a = vec![Field::new("age", FieldType::Number, "Age")];
        let b = vec![Field::new("age", FieldType::Number, "Age").required()];
        let fa = schema_fingerprint(&a).unwrap();
        assert_eq!(fa.len(), 64);
        assert_eq!(Some(fa.clone()), schema_fingerprint(&a));
        assert_ne!(Some(fa), schema_fingerprint(&b));
    }
}
