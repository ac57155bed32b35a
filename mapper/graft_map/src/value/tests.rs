use pretty_assertions::assert_eq;

use super::*;

// === Handle ===

#[test]
fn handle_identity_is_per_allocation() {
    let a = Handle::new(5i64);
    let b = Handle::new(5i64);
    assert!(Handle::ptr_eq(&a, &a.clone()));
    assert!(!Handle::ptr_eq(&a, &b));
}

#[test]
fn typed_borrow_checks_the_payload_type() {
    let handle = Handle::new("text".to_string());
    assert!(handle.is::<String>());
    assert!(!handle.is::<i64>());
    assert_eq!(handle.borrow::<String>().map(|s| s.len()), Some(4));
    assert!(handle.borrow::<i64>().is_none());
}

#[test]
fn mutable_borrow_writes_through() {
    let handle = Handle::new(1i64);
    if let Some(mut value) = handle.borrow_mut::<i64>() {
        *value = 9;
    }
    assert_eq!(handle.borrow::<i64>().map(|v| *v), Some(9));
}

// === Option ===

#[test]
fn none_erases_to_null_and_back() {
    let none: Option<i64> = None;
    assert!(matches!(none.to_value(), Value::Null));
    assert_eq!(Option::<i64>::from_value(Value::Null), Ok(None));
}

#[test]
fn some_erases_to_its_payload() {
    assert!(matches!(Some(3i64).to_value(), Value::Int(3)));
    assert_eq!(Option::<i64>::from_value(Value::Int(3)), Ok(Some(3)));
}

// === Sequences ===

#[test]
fn vec_round_trips_through_seq() {
    let value = vec![1i64, 2, 3].to_value();
    assert!(matches!(&value, Value::Seq(items) if items.len() == 3));
    assert_eq!(Vec::<i64>::from_value(value), Ok(vec![1, 2, 3]));
}

#[test]
fn vec_rejects_non_sequences() {
    assert!(Vec::<i64>::from_value(Value::Int(1)).is_err());
}

#[test]
fn fixed_array_requires_exact_cardinality() {
    let three = Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(<[i64; 3]>::from_value(three), Ok([1, 2, 3]));

    let two = Value::Seq(vec![Value::Int(1), Value::Int(2)]);
    assert!(<[i64; 3]>::from_value(two).is_err());
}

// === Diagnostics ===

#[test]
fn describe_renders_scalars_and_opaque_values() {
    assert_eq!(Value::Int(-4).describe(), "-4");
    assert_eq!(Value::Str("hi".to_string()).describe(), "\"hi\"");
    assert_eq!(Value::Null.describe(), "null");
    assert_eq!(
        Value::Seq(vec![Value::Int(1)]).describe(),
        "<sequence of 1>"
    );
    assert_eq!(Value::Shared(Handle::new(1u8)).describe(), "<shared instance>");
}
