use form_domain::{Conditional, ConditionalOperator};
use serde_json::Value;
use std::collections::HashMap;

use crate::validation::coercion::{compare_numeric, includes, loose_equal};

/// Evalúa un `Conditional` contra los valores ya recolectados (campos previos
/// y visibles). Una referencia ausente de `collected` nunca se satisface.
pub fn is_satisfied(conditional: &Conditional, collected: &HashMap<&str, &Value>) -> bool {
    let Some(actual) = collected.get(conditional.field_id.as_str()) else {
        return false;
    };
    let expected = &conditional.value;
    match &conditional.operator {
        ConditionalOperator::Equals => loose_equal(actual, expected),
        ConditionalOperator::NotEquals => !loose_equal(actual, expected),
        ConditionalOperator::Includes => includes(actual, expected),
        ConditionalOperator::GreaterOrEqual => compare_numeric(actual, expected, |a, b| a >= b),
        ConditionalOperator::LessOrEqual => compare_numeric(actual, expected, |a, b| a <= b),
        ConditionalOperator::Greater => compare_numeric(actual, expected, |a, b| a > b),
        ConditionalOperator::Less => compare_numeric(actual, expected, |a, b| a < b),
        ConditionalOperator::Unknown(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operators_against_collected_values() {
        let age = json!("17");
        let tags = json!(["vip", "beta"]);
        let collected: HashMap<&str, &Value> = HashMap::from([("age", &age), ("tags", &tags)]);

        let cases = [(Conditional::new("age", ConditionalOperator::Less, json!(18)), true),
                     (Conditional::new("age", ConditionalOperator::GreaterOrEqual, json!(18)), false),
                     (Conditional::new("age", ConditionalOperator::Equals, json!(17)), true),
                     (Conditional::new("age", ConditionalOperator::NotEquals, json!(17)), false),
                     (Conditional::new("tags", ConditionalOperator::Includes, json!("vip")), true),
                     (Conditional::new("tags", ConditionalOperator::Unknown("~=".into()), json!("vip")), false),
                     (Conditional::new("missing", ConditionalOperator::NotEquals, json!(1)), false)];
        for (cond, expected) in cases {
            assert_eq!(is_satisfied(&cond, &collected), expected, "{cond:?}");
        }
    }
}
