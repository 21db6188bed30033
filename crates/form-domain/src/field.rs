//! Definición universal de un campo de formulario.
//!
//! Un `Field` lleva todos los atributos posibles para cualquier tipo; el
//! `field_type` decide cuáles usa el renderer y cuáles el validador. Los
//! atributos que no aplican a un tipo se ignoran (esquema permisivo), nunca se
//! rechazan.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::conditional::Conditional;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Valor por defecto o estático (sólo pista de render).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,

    // Campos de elección (select, radio, checkbox, rank)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,

    // Number / Slider / Rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label: Option<String>,

    // Textarea
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,

    // Cálculo: "{field_a} + {field_b}"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    // Lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,

    // Payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Field {
    /// Campo mínimo de un tipo dado; el resto de atributos se fija con los
    /// builders `with_*`.
    pub fn new(id: &str, field_type: FieldType, label: &str) -> Self {
        Self { id: id.to_string(),
               field_type,
               label: label.to_string(),
               required: false,
               read_only: false,
               placeholder: None,
               value: None,
               conditional: None,
               validation: None,
               options: Vec::new(),
               min: None,
               max: None,
               step: None,
               min_label: None,
               max_label: None,
               rows: None,
               formula: None,
               prefix: None,
               data_source: None,
               provider: None }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>, step: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self.step = step;
        self
    }

    pub fn with_conditional(mut self, conditional: Conditional) -> Self {
        self.conditional = Some(conditional);
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_options(mut self, values: &[&str]) -> Self {
        self.options = values.iter()
                             .map(|v| FieldOption { label: v.to_string(),
                                                    value: v.to_string() })
                             .collect();
        self
    }

    pub fn with_formula(mut self, formula: &str) -> Self {
        self.formula = Some(formula.to_string());
        self
    }

    /// Un campo es calculado si declara fórmula o es de tipo `calculation`.
    pub fn is_computed(&self) -> bool {
        self.formula.as_deref().is_some_and(|f| !f.trim().is_empty()) || self.field_type.capability() == FieldCapability::Computed
    }
}

/// Opción de un campo de elección.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

/// Reglas de validación personalizadas de una instancia de campo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Expresión regular.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_error_message: Option<String>,
}

/// Origen externo de un campo `lookup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub value_field: String,
    #[serde(default)]
    pub label_field: String,
}

/// Familia de chequeos que el evaluador aplica a un tipo de campo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCapability {
    Numeric,
    Text,
    SingleChoice,
    MultiChoice,
    Computed,
    /// Sin chequeos de tipo (lookup, payment, tipos desconocidos...).
    PassThrough,
}

/// Tag de tipo de campo. Se serializa como el string libre original; los tags
/// no reconocidos se conservan en `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Phone,
    Url,
    Password,
    Number,
    Slider,
    Rating,
    Select,
    Dropdown,
    Radio,
    Checkbox,
    Rank,
    MultiSelect,
    Calculation,
    Lookup,
    Payment,
    Date,
    File,
    Unknown(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Url => "url",
            FieldType::Password => "password",
            FieldType::Number => "number",
            FieldType::Slider => "slider",
            FieldType::Rating => "rating",
            FieldType::Select => "select",
            FieldType::Dropdown => "dropdown",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Rank => "rank",
            FieldType::MultiSelect => "multiselect",
            FieldType::Calculation => "calculation",
            FieldType::Lookup => "lookup",
            FieldType::Payment => "payment",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Unknown(tag) => tag,
        }
    }

    pub fn capability(&self) -> FieldCapability {
        match self {
            FieldType::Number | FieldType::Slider | FieldType::Rating => FieldCapability::Numeric,
            FieldType::Text | FieldType::Textarea | FieldType::Email | FieldType::Phone | FieldType::Url | FieldType::Password => {
                FieldCapability::Text
            }
            FieldType::Select | FieldType::Dropdown | FieldType::Radio => FieldCapability::SingleChoice,
            FieldType::Checkbox | FieldType::Rank | FieldType::MultiSelect => FieldCapability::MultiChoice,
            FieldType::Calculation => FieldCapability::Computed,
            FieldType::Lookup | FieldType::Payment | FieldType::Date | FieldType::File | FieldType::Unknown(_) => {
                FieldCapability::PassThrough
            }
        }
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "text" => FieldType::Text,
            "textarea" => FieldType::Textarea,
            "email" => FieldType::Email,
            "phone" => FieldType::Phone,
            "url" => FieldType::Url,
            "password" => FieldType::Password,
            "number" => FieldType::Number,
            "slider" => FieldType::Slider,
            "rating" => FieldType::Rating,
            "select" => FieldType::Select,
            "dropdown" => FieldType::Dropdown,
            "radio" => FieldType::Radio,
            "checkbox" => FieldType::Checkbox,
            "rank" => FieldType::Rank,
            "multiselect" => FieldType::MultiSelect,
            "calculation" => FieldType::Calculation,
            "lookup" => FieldType::Lookup,
            "payment" => FieldType::Payment,
            "date" => FieldType::Date,
            "file" => FieldType::File,
            _ => FieldType::Unknown(raw),
        }
    }
}

impl From<&str> for FieldType {
    fn from(raw: &str) -> Self {
        FieldType::from(raw.to_string())
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_reads_camel_case_wire_format() {
        let f: Field = serde_json::from_value(json!({
            "id": "bio",
            "type": "textarea",
            "label": "Bio",
            "readOnly": true,
            "rows": 4,
            "validation": {"maxLength": 10, "patternErrorMessage": "nope"}
        })).unwrap();
        assert_eq!(f.field_type, FieldType::Textarea);
        assert!(f.read_only);
        assert_eq!(f.rows, Some(4));
        let v = f.validation.unwrap();
        assert_eq!(v.max_length, Some(10));
        assert_eq!(v.pattern_error_message.as_deref(), Some("nope"));
    }

    #[test]
    fn unknown_type_tag_is_kept_verbatim() {
        let f: Field = serde_json::from_value(json!({"id": "sig", "type": "Signature"})).unwrap();
        assert_eq!(f.field_type, FieldType::Unknown("Signature".into()));
        assert_eq!(f.field_type.capability(), FieldCapability::PassThrough);
        assert_eq!(serde_json::to_value(&f).unwrap()["type"], json!("Signature"));
    }

    #[test]
    fn calculation_type_is_computed() {
        let f = Field::new("total", FieldType::Calculation, "Total").with_formula("{price} * {qty}");
        assert!(f.is_computed());
    }

    #[test]
    fn number_field_with_formula_is_computed() {
        let f = Field::new("n", FieldType::Number, "N").with_formula("{a}");
        assert!(f.is_computed());
        assert!(!Field::new("m", FieldType::Number, "M").is_computed());
    }
}
