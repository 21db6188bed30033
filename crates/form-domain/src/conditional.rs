//! Reglas de visibilidad condicional (`Conditional`).
//!
//! Un `Conditional` compara el valor ya recolectado de otro campo contra un
//! valor fijo. El operador es un enum cerrado con fallback `Unknown` para no
//! romper esquemas escritos por versiones más nuevas del renderer.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    /// Id del campo cuyo valor se consulta.
    pub field_id: String,
    pub operator: ConditionalOperator,
    #[serde(default)]
    pub value: Value,
}

impl Conditional {
    pub fn new(field_id: &str, operator: ConditionalOperator, value: Value) -> Self {
        Self { field_id: field_id.to_string(),
               operator,
               value }
    }
}

/// Operadores soportados. `>` y `<` son extensiones sobre el set original.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionalOperator {
    Equals,
    NotEquals,
    Includes,
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
    /// Operador desconocido: la condición nunca se satisface.
    Unknown(String),
}

impl ConditionalOperator {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionalOperator::Equals => "==",
            ConditionalOperator::NotEquals => "!=",
            ConditionalOperator::Includes => "includes",
            ConditionalOperator::GreaterOrEqual => ">=",
            ConditionalOperator::LessOrEqual => "<=",
            ConditionalOperator::Greater => ">",
            ConditionalOperator::Less => "<",
            ConditionalOperator::Unknown(raw) => raw,
        }
    }
}

impl From<String> for ConditionalOperator {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "==" | "eq" => ConditionalOperator::Equals,
            "!=" | "ne" => ConditionalOperator::NotEquals,
            "includes" => ConditionalOperator::Includes,
            ">=" | "gte" => ConditionalOperator::GreaterOrEqual,
            "<=" | "lte" => ConditionalOperator::LessOrEqual,
            ">" | "gt" => ConditionalOperator::Greater,
            "<" | "lt" => ConditionalOperator::Less,
            _ => ConditionalOperator::Unknown(raw),
        }
    }
}

impl From<&str> for ConditionalOperator {
    fn from(raw: &str) -> Self {
        ConditionalOperator::from(raw.to_string())
    }
}

impl From<ConditionalOperator> for String {
    fn from(op: ConditionalOperator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for ConditionalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
