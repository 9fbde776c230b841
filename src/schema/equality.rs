//! Structural equality for JSON values.

use serde_json::{Number, Value};

/// Returns true if `a` and `b` are structurally equal.
///
/// Numbers compare by numeric value (`1` equals `1.0`), objects compare
/// without regard to key order, and values of different JSON types are never
/// equal (`0 != false`, `1 != true`).
///
/// # Example
///
/// ```rust
/// use formschema::deep_equal;
/// use serde_json::json;
///
/// assert!(deep_equal(&json!({ "a": [1, 2.0] }), &json!({ "a": [1.0, 2] })));
/// assert!(!deep_equal(&json!(0), &json!(false)));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, l)| y.get(key).is_some_and(|r| deep_equal(l, r)))
        }
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(l), Some(r)) = (x.as_i64(), y.as_i64()) {
        return l == r;
    }
    if let (Some(l), Some(r)) = (x.as_u64(), y.as_u64()) {
        return l == r;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_primitives() {
        assert!(deep_equal(&json!(null), &json!(null)));
        assert!(deep_equal(&json!("a"), &json!("a")));
        assert!(!deep_equal(&json!("a"), &json!("b")));
        assert!(!deep_equal(&json!(1), &json!(true)));
        assert!(!deep_equal(&json!(null), &json!(0)));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(deep_equal(&json!(1), &json!(1.0)));
        assert!(deep_equal(&json!(-3), &json!(-3.0)));
        assert!(!deep_equal(&json!(1), &json!(1.5)));
        assert!(deep_equal(&json!(u64::MAX), &json!(u64::MAX)));
    }

    #[test]
    fn test_objects_ignore_key_order() {
        let a: Value = serde_json::from_str(r#"{"x": 1, "y": [true]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y": [true], "x": 1}"#).unwrap();
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&json!({ "x": 1 }), &json!({ "x": 1, "y": 2 })));
    }

    #[test]
    fn test_arrays_are_ordered() {
        assert!(!deep_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!deep_equal(&json!([1]), &json!([1, 1])));
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,4}".prop_map(Value::String),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-c]", inner, 0..3)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_reflexive(value in arb_value()) {
            prop_assert!(deep_equal(&value, &value));
        }

        #[test]
        fn prop_symmetric(a in arb_value(), b in arb_value()) {
            prop_assert_eq!(deep_equal(&a, &b), deep_equal(&b, &a));
        }
    }
}
