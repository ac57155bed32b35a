//! Scalar value coercion.
//!
//! Null maps to null; nullable wrappers are unwrapped before coercion;
//! everything else goes through a generic conversion that attempts
//! checked numeric widening/narrowing and textual parsing. A value that
//! cannot be converted yields a [`ConvertError`] identifying the source
//! value and the destination type.

use graft_types::{ScalarKind, TypeToken};

use crate::error::ConvertError;
use crate::value::{FromValue, ToValue, Value};

/// Coerce a tagged value to the scalar kind declared by `dest`.
///
/// Non-scalar destinations pass the value through untouched; the
/// destination setter has the final say on acceptability.
pub(crate) fn coerce(value: Value, dest: &TypeToken) -> Result<Value, ConvertError> {
    if matches!(value, Value::Null) {
        return Ok(Value::Null);
    }
    // Unwrap a nullable wrapper to its underlying type first.
    let target = dest.inner_token().unwrap_or_else(|| dest.clone());
    let Some(kind) = target.scalar() else {
        return Ok(value);
    };
    match kind {
        ScalarKind::Bool => to_bool(value, target.name()).map(Value::Bool),
        ScalarKind::I8 => narrow_int::<i8>(value, target.name()).map(|v| Value::Int(v.into())),
        ScalarKind::I16 => narrow_int::<i16>(value, target.name()).map(|v| Value::Int(v.into())),
        ScalarKind::I32 => narrow_int::<i32>(value, target.name()).map(|v| Value::Int(v.into())),
        ScalarKind::I64 => to_i64(value, target.name()).map(Value::Int),
        ScalarKind::U8 => narrow_uint::<u8>(value, target.name()).map(|v| Value::UInt(v.into())),
        ScalarKind::U16 => narrow_uint::<u16>(value, target.name()).map(|v| Value::UInt(v.into())),
        ScalarKind::U32 => narrow_uint::<u32>(value, target.name()).map(|v| Value::UInt(v.into())),
        ScalarKind::U64 => to_u64(value, target.name()).map(Value::UInt),
        ScalarKind::F32 | ScalarKind::F64 => to_f64(value, target.name()).map(Value::Float),
        ScalarKind::Char => to_char(value, target.name()).map(Value::Char),
        ScalarKind::Str => to_string(value, target.name()).map(Value::Str),
    }
}

pub(crate) fn to_i64(value: Value, to: &str) -> Result<i64, ConvertError> {
    let err = |value: &Value| ConvertError::new(value.describe(), to);
    match value {
        Value::Int(i) => Ok(i),
        Value::UInt(u) => i64::try_from(u).map_err(|_| err(&Value::UInt(u))),
        Value::Float(f) => float_to_int(f, to),
        Value::Bool(b) => Ok(i64::from(b)),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ConvertError::new(format!("{s:?}"), to)),
        other => Err(err(&other)),
    }
}

pub(crate) fn to_u64(value: Value, to: &str) -> Result<u64, ConvertError> {
    let err = |value: &Value| ConvertError::new(value.describe(), to);
    match value {
        Value::UInt(u) => Ok(u),
        Value::Int(i) => u64::try_from(i).map_err(|_| err(&Value::Int(i))),
        Value::Float(f) => {
            let rounded = float_to_int(f, to)?;
            u64::try_from(rounded).map_err(|_| ConvertError::new(f.to_string(), to))
        }
        Value::Bool(b) => Ok(u64::from(b)),
        Value::Str(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| ConvertError::new(format!("{s:?}"), to)),
        other => Err(err(&other)),
    }
}

pub(crate) fn to_f64(value: Value, to: &str) -> Result<f64, ConvertError> {
    match value {
        Value::Float(f) => Ok(f),
        Value::Int(i) => Ok(i as f64),
        Value::UInt(u) => Ok(u as f64),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ConvertError::new(format!("{s:?}"), to)),
        other => Err(ConvertError::new(other.describe(), to)),
    }
}

pub(crate) fn to_bool(value: Value, to: &str) -> Result<bool, ConvertError> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Int(i) => Ok(i != 0),
        Value::UInt(u) => Ok(u != 0),
        Value::Str(s) => s
            .trim()
            .parse::<bool>()
            .map_err(|_| ConvertError::new(format!("{s:?}"), to)),
        other => Err(ConvertError::new(other.describe(), to)),
    }
}

pub(crate) fn to_char(value: Value, to: &str) -> Result<char, ConvertError> {
    match value {
        Value::Char(c) => Ok(c),
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(ConvertError::new(format!("{s:?}"), to)),
            }
        }
        other => Err(ConvertError::new(other.describe(), to)),
    }
}

pub(crate) fn to_string(value: Value, to: &str) -> Result<String, ConvertError> {
    match value {
        Value::Str(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::UInt(u) => Ok(u.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Char(c) => Ok(c.to_string()),
        other => Err(ConvertError::new(other.describe(), to)),
    }
}

/// Round a float to the nearest integer, rejecting values outside the
/// representable range.
fn float_to_int(f: f64, to: &str) -> Result<i64, ConvertError> {
    let rounded = f.round();
    // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return Err(ConvertError::new(f.to_string(), to));
    }
    Ok(rounded as i64)
}

fn narrow_int<T>(value: Value, to: &str) -> Result<T, ConvertError>
where
    T: TryFrom<i64>,
{
    let wide = to_i64(value, to)?;
    T::try_from(wide).map_err(|_| ConvertError::new(wide.to_string(), to))
}

fn narrow_uint<T>(value: Value, to: &str) -> Result<T, ConvertError>
where
    T: TryFrom<u64>,
{
    let wide = to_u64(value, to)?;
    T::try_from(wide).map_err(|_| ConvertError::new(wide.to_string(), to))
}

macro_rules! int_value_conversions {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ConvertError> {
                    narrow_int::<$ty>(value, stringify!($ty))
                }
            }
        )+
    };
}

macro_rules! uint_value_conversions {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::UInt(u64::from(*self))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ConvertError> {
                    narrow_uint::<$ty>(value, stringify!($ty))
                }
            }
        )+
    };
}

int_value_conversions!(i8, i16, i32);
uint_value_conversions!(u8, u16, u32);

impl ToValue for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        to_i64(value, "i64")
    }
}

impl ToValue for u64 {
    fn to_value(&self) -> Value {
        Value::UInt(*self)
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        to_u64(value, "u64")
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        to_f64(value, "f32").map(|f| f as f32)
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        to_f64(value, "f64")
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        to_bool(value, "bool")
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::Char(*self)
    }
}

impl FromValue for char {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        to_char(value, "char")
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        to_string(value, "String")
    }
}

#[cfg(test)]
mod tests;
