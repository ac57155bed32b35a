#![allow(clippy::unwrap_used)]

use graft_types::TypeInfo;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

// === Widening ===

#[test]
fn int_widens_to_i64() {
    assert_eq!(i64::from_value(5i32.to_value()), Ok(5));
}

#[test]
fn uint_crosses_into_int_when_in_range() {
    assert_eq!(i64::from_value(7u64.to_value()), Ok(7));
}

#[test]
fn int_widens_to_float() {
    assert_eq!(f64::from_value(3i32.to_value()), Ok(3.0));
}

// === Narrowing ===

#[test]
fn narrowing_in_range_succeeds() {
    assert_eq!(i8::from_value(Value::Int(127)), Ok(127));
}

#[test]
fn narrowing_out_of_range_fails() {
    let err = i8::from_value(Value::Int(128)).unwrap_err();
    assert_eq!(err.to, "i8");
    assert_eq!(err.value, "128");
}

#[test]
fn negative_into_unsigned_fails() {
    assert!(u32::from_value(Value::Int(-1)).is_err());
}

#[test]
fn huge_uint_into_i64_fails() {
    assert!(i64::from_value(Value::UInt(u64::MAX)).is_err());
}

// === Floats ===

#[test]
fn float_rounds_into_int() {
    assert_eq!(i32::from_value(Value::Float(2.6)), Ok(3));
}

#[test]
fn non_finite_float_into_int_fails() {
    assert!(i64::from_value(Value::Float(f64::NAN)).is_err());
    assert!(i64::from_value(Value::Float(f64::INFINITY)).is_err());
}

// === Textual parsing ===

#[test]
fn string_parses_into_int() {
    assert_eq!(i32::from_value(Value::Str(" 42 ".to_string())), Ok(42));
}

#[test]
fn unparseable_string_fails_with_value_and_type() {
    let err = i32::from_value(Value::Str("abc".to_string())).unwrap_err();
    assert_eq!(err.value, "\"abc\"");
    assert_eq!(err.to, "i32");
}

#[test]
fn string_parses_into_bool_and_float() {
    assert_eq!(bool::from_value(Value::Str("true".to_string())), Ok(true));
    assert_eq!(f64::from_value(Value::Str("2.5".to_string())), Ok(2.5));
}

#[test]
fn scalars_stringify() {
    assert_eq!(
        String::from_value(Value::Int(9)),
        Ok("9".to_string())
    );
    assert_eq!(
        String::from_value(Value::Bool(false)),
        Ok("false".to_string())
    );
}

#[test]
fn single_char_string_becomes_char() {
    assert_eq!(char::from_value(Value::Str("x".to_string())), Ok('x'));
    assert!(char::from_value(Value::Str("xy".to_string())).is_err());
    assert!(char::from_value(Value::Str(String::new())).is_err());
}

// === Null and nullable wrappers ===

#[test]
fn null_into_scalar_fails() {
    let err = i32::from_value(Value::Null).unwrap_err();
    assert_eq!(err.value, "null");
}

#[test]
fn null_into_option_is_none() {
    assert_eq!(Option::<i32>::from_value(Value::Null), Ok(None));
}

#[test]
fn option_unwraps_before_coercion() {
    assert_eq!(Option::<i64>::from_value(Value::Int(5)), Ok(Some(5)));
}

#[test]
fn coerce_unwraps_nullable_destination() {
    let coerced = coerce(Value::Str("8".to_string()), &Option::<i32>::token());
    assert!(matches!(coerced, Ok(Value::Int(8))));
}

#[test]
fn coerce_passes_null_through() {
    assert!(matches!(
        coerce(Value::Null, &i32::token()),
        Ok(Value::Null)
    ));
}

#[test]
fn coerce_leaves_non_scalar_destinations_alone() {
    let value = coerce(Value::Seq(vec![]), &Vec::<i32>::token());
    assert!(matches!(value, Ok(Value::Seq(_))));
}

// === Composite values never coerce to scalars ===

#[test]
fn object_into_scalar_fails() {
    let err = i32::from_value(Value::Object(Box::new("opaque"))).unwrap_err();
    assert_eq!(err.value, "<object>");
}

proptest! {
    #[test]
    fn widening_preserves_every_i32(n in any::<i32>()) {
        prop_assert_eq!(i64::from_value(n.to_value()), Ok(i64::from(n)));
    }

    #[test]
    fn stringified_ints_parse_back(n in any::<i64>()) {
        let text = Value::Str(n.to_string());
        prop_assert_eq!(i64::from_value(text), Ok(n));
    }

    #[test]
    fn narrowing_never_panics(n in any::<i64>()) {
        let _ = i16::from_value(Value::Int(n));
    }
}
