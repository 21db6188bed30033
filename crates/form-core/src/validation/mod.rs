//! Evaluador de validación: `validate(schema, data)`.
//!
//! Recorre los campos en el orden del esquema. Un campo con `conditional` sólo
//! ve los valores de campos anteriores, visibles y sin violaciones; si la
//! condición no se cumple el campo se omite por completo (ni `required` ni
//! chequeos de tipo). Los campos calculados nunca se validan.
//!
//! Función pura y total: no hace I/O, no entra en pánico.
pub mod coercion;
pub mod conditional;
pub mod rules;
pub mod violation;

use form_domain::FormSchema;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub use conditional::is_satisfied;
pub use violation::{ValidationResult, Violation};

use crate::validation::coercion::is_empty;
use crate::validation::rules::check_field;

pub fn validate(schema: &FormSchema, data: &Map<String, Value>) -> ValidationResult {
    let mut violations = Vec::new();
    let mut collected: HashMap<&str, &Value> = HashMap::with_capacity(schema.fields.len());

    for field in &schema.fields {
        if field.is_computed() {
            continue;
        }
        if let Some(cond) = &field.conditional {
            if !is_satisfied(cond, &collected) {
                continue;
            }
        }

        let value = data.get(field.id.as_str());
        match value {
            Some(v) if !is_empty(v) => {
                let found = check_field(field, v);
                if found.is_empty() {
                    collected.insert(field.id.as_str(), v);
                } else {
                    violations.extend(found);
                }
            }
            _ if field.required => violations.push(Violation::MissingRequired { field_id: field.id.clone() }),
            Some(v) => {
                collected.insert(field.id.as_str(), v);
            }
            None => {}
        }
    }

    ValidationResult { violations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_domain::{Conditional, ConditionalOperator, Field, FieldType};
    use serde_json::json;
    use uuid::Uuid;

    fn schema(fields: Vec<Field>) -> FormSchema {
        FormSchema::new("t", None, fields, Uuid::new_v4()).unwrap()
    }

    fn data(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn forward_and_self_references_never_satisfy() {
        let s = schema(vec![Field::new("a", FieldType::Text, "A").required()
                                                             .with_conditional(Conditional::new("b",
                                                                                                ConditionalOperator::Equals,
                                                                                                json!("x"))),
                            Field::new("b", FieldType::Text, "B"),
                            Field::new("c", FieldType::Text, "C").required()
                                                             .with_conditional(Conditional::new("c",
                                                                                                ConditionalOperator::NotEquals,
                                                                                                json!("z")))]);
        assert!(validate(&s, &data(json!({"b": "x"}))).is_valid());
    }

    #[test]
    fn hidden_fields_do_not_feed_later_conditionals() {
        let s = schema(vec![Field::new("toggle", FieldType::Checkbox, "T").with_options(&["on"]),
                            Field::new("detail", FieldType::Text, "D").with_conditional(Conditional::new("toggle",
                                                                                                        ConditionalOperator::Includes,
                                                                                                        json!("on"))),
                            Field::new("extra", FieldType::Text, "E").required()
                                                                     .with_conditional(Conditional::new("detail",
                                                                                                        ConditionalOperator::NotEquals,
                                                                                                        json!("")))]);
        // toggle vacío: detail oculto, y extra no puede depender de él
        assert!(validate(&s, &data(json!({"detail": "ignored"}))).is_valid());
        let r = validate(&s, &data(json!({"toggle": ["on"], "detail": "shown"})));
        assert_eq!(r.violations, vec![Violation::MissingRequired { field_id: "extra".into() }]);
    }

    #[test]
    fn invalid_values_are_not_collected() {
        let s = schema(vec![Field::new("n", FieldType::Number, "N").with_range(Some(0.0), Some(5.0), None),
                            Field::new("why", FieldType::Text, "Why").required()
                                                                      .with_conditional(Conditional::new("n",
                                                                                                         ConditionalOperator::Greater,
                                                                                                         json!(3)))]);
        let r = validate(&s, &data(json!({"n": 9})));
        assert_eq!(r.violations.len(), 1);
        assert_eq!(r.violations[0].field_id(), "n");
    }

    #[test]
    fn computed_fields_are_skipped_even_when_required() {
        let s = schema(vec![Field::new("total", FieldType::Calculation, "Total").required(),
                            Field::new("n", FieldType::Number, "N").with_formula("{a}+1").required()]);
        assert!(validate(&s, &data(json!({"total": "garbage"}))).is_valid());
    }

    #[test]
    fn violations_follow_schema_order() {
        let s = schema(vec![Field::new("first", FieldType::Text, "F").required(),
                            Field::new("second", FieldType::Email, "S"),
                            Field::new("third", FieldType::Number, "T").required()]);
        let r = validate(&s, &data(json!({"second": "nope", "third": ""})));
        let ids: Vec<&str> = r.violations.iter().map(|v| v.field_id()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert!(r.into_result().is_err());
    }
}
