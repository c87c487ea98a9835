use serde_json::Value;

use crate::AnyMessage;

/// Reports whether `actual` contains everything specified by `expected`.
///
/// Both messages are compared through their serialized form. Zero values in
/// `expected` (`null`, `false`, `0`, `""`, `[]`, `{}`) mean "don't care".
/// Objects are compared field by field; every expected key must be present
/// in the actual object, even when its expected value is zero. Every element of an expected array
/// must be matched by some element of the actual array, in any order. Any
/// other value must be equal.
pub fn is_superset(actual: &dyn AnyMessage, expected: &dyn AnyMessage) -> bool {
    actual.type_of() == expected.type_of() && contains(&actual.to_json(), &expected.to_json())
}

fn contains(actual: &Value, expected: &Value) -> bool {
    if is_zero(expected) {
        return true;
    }
    match (actual, expected) {
        (Value::Object(a), Value::Object(e)) => e
            .iter()
            .all(|(key, ev)| a.get(key).is_some_and(|av| is_zero(ev) || contains(av, ev))),
        (Value::Array(a), Value::Array(e)) => e.iter().all(|ev| a.iter().any(|av| contains(av, ev))),
        _ => actual == expected,
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fixtures::{EvtA, Limits, Tagged};

    #[test]
    fn zero_fields_in_expected_are_ignored() {
        let actual = Tagged { name: "alpha".into(), tags: vec!["x".into(), "y".into()], count: 3 };
        let expected = Tagged { name: String::new(), tags: vec![], count: 3 };
        assert!(is_superset(&actual, &expected));
    }

    #[test]
    fn array_elements_match_in_any_order() {
        let actual = Tagged { name: "alpha".into(), tags: vec!["x".into(), "y".into()], count: 0 };
        let expected = Tagged { name: "alpha".into(), tags: vec!["y".into()], count: 0 };
        assert!(is_superset(&actual, &expected));

        let missing = Tagged { name: "alpha".into(), tags: vec!["z".into()], count: 0 };
        assert!(!is_superset(&actual, &missing));
    }

    #[test]
    fn non_zero_scalars_must_match() {
        assert!(!is_superset(&EvtA { value: 1 }, &EvtA { value: 2 }));
        assert!(is_superset(&EvtA { value: 2 }, &EvtA { value: 0 }));
    }

    #[test]
    fn different_types_are_never_supersets() {
        assert!(!is_superset(&Box::new(EvtA { value: 1 }), &EvtA { value: 1 }));
    }

    #[test]
    fn nested_objects_compare_recursively() {
        assert!(contains(
            &json!({"a": {"b": 1, "c": 2}, "d": true}),
            &json!({"a": {"c": 2}, "d": false})
        ));
        assert!(!contains(&json!({"a": {"b": 1}}), &json!({"a": {"b": 2}})));
    }

    #[test]
    fn map_keys_must_exist_even_with_zero_values() {
        let actual = Limits { limits: [("other".to_owned(), 5)].into() };
        let expected = Limits { limits: [("daily".to_owned(), 0)].into() };
        assert!(!is_superset(&actual, &expected));

        let actual = Limits { limits: [("daily".to_owned(), 3), ("other".to_owned(), 5)].into() };
        assert!(is_superset(&actual, &expected));
        assert!(!is_superset(&actual, &Limits { limits: [("daily".to_owned(), 4)].into() }));
    }
}
