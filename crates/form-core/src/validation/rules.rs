//! Chequeos por familia de tipo (`FieldCapability`) sobre un valor presente
//! y no vacío. Cada función acumula violaciones; ninguna corta el resto.
use form_domain::{Field, FieldCapability, Validation};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::constants::STEP_EPSILON;
use crate::validation::coercion::{to_f64, to_text};
use crate::validation::Violation;

static EMAIL_SHAPE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

pub fn check_field(field: &Field, value: &Value) -> Vec<Violation> {
    let mut out = Vec::new();
    match field.field_type.capability() {
        FieldCapability::Numeric => check_numeric(field, value, &mut out),
        FieldCapability::Text => check_text(field, value, &mut out),
        FieldCapability::SingleChoice => check_single_choice(field, value, &mut out),
        FieldCapability::MultiChoice => check_multi_choice(field, value, &mut out),
        FieldCapability::Computed | FieldCapability::PassThrough => {}
    }
    out
}

fn check_numeric(field: &Field, value: &Value, out: &mut Vec<Violation>) {
    let Some(v) = to_f64(value) else {
        out.push(Violation::NotANumber { field_id: field.id.clone() });
        return;
    };
    if let Some(min) = field.min {
        if v < min {
            out.push(Violation::BelowMinimum { field_id: field.id.clone(), min, value: v });
        }
    }
    if let Some(max) = field.max {
        if v > max {
            out.push(Violation::AboveMaximum { field_id: field.id.clone(), max, value: v });
        }
    }
    if let Some(step) = field.step.filter(|s| *s > 0.0 && s.is_finite()) {
        let base = field.min.unwrap_or(0.0);
        let q = (v - base) / step;
        if (q - q.round()).abs() > STEP_EPSILON * q.abs().max(1.0) {
            out.push(Violation::StepMismatch { field_id: field.id.clone(), step, value: v });
        }
    }
}

fn check_text(field: &Field, value: &Value, out: &mut Vec<Violation>) {
    let Some(text) = to_text(value) else {
        out.push(Violation::WrongType { field_id: field.id.clone(),
                                        expected: "text".to_string() });
        return;
    };
    if let Some(rules) = &field.validation {
        check_length(field, rules, &text, out);
        check_pattern(field, rules, &text, out);
    }
    if field.field_type == form_domain::FieldType::Email
       && !EMAIL_SHAPE.as_ref().is_some_and(|re| re.is_match(text.trim()))
    {
        out.push(Violation::InvalidEmail { field_id: field.id.clone() });
    }
}

fn check_length(field: &Field, rules: &Validation, text: &str, out: &mut Vec<Violation>) {
    let length = text.chars().count();
    // 0 equivale a "sin límite"
    if let Some(min_length) = rules.min_length.filter(|n| *n > 0) {
        if length < min_length {
            out.push(Violation::TooShort { field_id: field.id.clone(), min_length, length });
        }
    }
    if let Some(max_length) = rules.max_length.filter(|n| *n > 0) {
        if length > max_length {
            out.push(Violation::TooLong { field_id: field.id.clone(), max_length, length });
        }
    }
}

fn check_pattern(field: &Field, rules: &Validation, text: &str, out: &mut Vec<Violation>) {
    let Some(pattern) = rules.pattern.as_deref().filter(|p| !p.is_empty()) else {
        return;
    };
    match Regex::new(pattern) {
        Ok(re) if re.is_match(text) => {}
        Ok(_) => {
            let message = rules.pattern_error_message
                               .clone()
                               .filter(|m| !m.trim().is_empty())
                               .unwrap_or_else(|| format!("{} has an invalid format", field.id));
            out.push(Violation::PatternMismatch { field_id: field.id.clone(), message });
        }
        Err(e) => warn!("field {}: ignoring invalid pattern {:?}: {}", field.id, pattern, e),
    }
}

fn is_option(field: &Field, candidate: &str) -> bool {
    field.options.iter().any(|o| o.value == candidate)
}

fn check_single_choice(field: &Field, value: &Value, out: &mut Vec<Violation>) {
    let Some(text) = to_text(value) else {
        out.push(Violation::WrongType { field_id: field.id.clone(),
                                        expected: "a single option".to_string() });
        return;
    };
    if !field.options.is_empty() && !is_option(field, &text) {
        out.push(Violation::NotAnOption { field_id: field.id.clone(), value: text });
    }
}

fn check_multi_choice(field: &Field, value: &Value, out: &mut Vec<Violation>) {
    // un escalar suelto cuenta como selección de un único elemento
    let items: Vec<&Value> = match value {
        Value::Array(arr) => arr.iter().collect(),
        Value::Object(_) => {
            out.push(Violation::WrongType { field_id: field.id.clone(),
                                            expected: "a list of options".to_string() });
            return;
        }
        scalar => vec![scalar],
    };
    if field.options.is_empty() {
        return;
    }
    for item in items {
        let text = to_text(item).unwrap_or_else(|| item.to_string());
        if !is_option(field, &text) {
            out.push(Violation::NotAnOption { field_id: field.id.clone(), value: text });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_domain::FieldType;
    use serde_json::json;

    #[test]
    fn numeric_range_and_step() {
        let f = Field::new("qty", FieldType::Slider, "Qty").with_range(Some(1.0), Some(10.0), Some(0.5));
        assert!(check_field(&f, &json!(2.5)).is_empty());
        assert!(check_field(&f, &json!("10")).is_empty());
        assert_eq!(check_field(&f, &json!(0)),
                   vec![Violation::BelowMinimum { field_id: "qty".into(), min: 1.0, value: 0.0 }]);
        assert!(matches!(check_field(&f, &json!(2.2))[..], [Violation::StepMismatch { .. }]));
        assert_eq!(check_field(&f, &json!("many")), vec![Violation::NotANumber { field_id: "qty".into() }]);
    }

    #[test]
    fn decimal_steps_tolerate_float_error() {
        let f = Field::new("p", FieldType::Number, "P").with_range(None, None, Some(0.1));
        assert!(check_field(&f, &json!(0.3)).is_empty());
        assert!(check_field(&f, &json!(1.7)).is_empty());
    }

    #[test]
    fn text_length_counts_characters() {
        let f = Field::new("nick", FieldType::Text, "Nick").with_validation(Validation { min_length: Some(2),
                                                                                       max_length: Some(4),
                                                                                       ..Default::default() });
        assert!(check_field(&f, &json!("ñañá")).is_empty());
        assert!(matches!(check_field(&f, &json!("a"))[..], [Violation::TooShort { length: 1, .. }]));
        assert!(matches!(check_field(&f, &json!("abcde"))[..], [Violation::TooLong { length: 5, .. }]));
        assert!(matches!(check_field(&f, &json!(["x"]))[..], [Violation::WrongType { .. }]));
    }

    #[test]
    fn pattern_uses_custom_message_and_ignores_invalid_regex() {
        let f = Field::new("zip", FieldType::Text, "Zip").with_validation(Validation { pattern: Some(r"^\d{5}$".into()),
                                                                                     pattern_error_message: Some("five digits".into()),
                                                                                     ..Default::default() });
        assert!(check_field(&f, &json!("12345")).is_empty());
        assert_eq!(check_field(&f, &json!("1234")),
                   vec![Violation::PatternMismatch { field_id: "zip".into(),
                                                     message: "five digits".into() }]);

        let broken = Field::new("b", FieldType::Text, "B").with_validation(Validation { pattern: Some("([".into()),
                                                                                     ..Default::default() });
        assert!(check_field(&broken, &json!("anything")).is_empty());
    }

    #[test]
    fn email_shape() {
        let f = Field::new("mail", FieldType::Email, "Mail");
        assert!(check_field(&f, &json!("ana@example.com")).is_empty());
        assert_eq!(check_field(&f, &json!("ana@")), vec![Violation::InvalidEmail { field_id: "mail".into() }]);
    }

    #[test]
    fn choices_are_checked_against_option_values() {
        let single = Field::new("color", FieldType::Radio, "Color").with_options(&["red", "blue"]);
        assert!(check_field(&single, &json!("red")).is_empty());
        assert!(matches!(check_field(&single, &json!("green"))[..], [Violation::NotAnOption { .. }]));

        let multi = Field::new("tags", FieldType::Checkbox, "Tags").with_options(&["a", "b"]);
        assert!(check_field(&multi, &json!(["a", "b"])).is_empty());
        assert_eq!(check_field(&multi, &json!(["a", "z", "y"])).len(), 2);

        let open = Field::new("free", FieldType::Select, "Free");
        assert!(check_field(&open, &json!("whatever")).is_empty());
    }

    #[test]
    fn pass_through_types_accept_anything() {
        let f = Field::new("sig", FieldType::Unknown("signature".into()), "Sig");
        assert!(check_field(&f, &json!({"svg": "<path/>"})).is_empty());
    }
}
