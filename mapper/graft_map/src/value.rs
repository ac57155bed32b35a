//! Type-erased tagged value representation.
//!
//! The engine recurses over [`Value`]s instead of constructing generic
//! calls at runtime: property getters erase field values into this tagged
//! form, the engine decides whether to coerce, recurse or reuse a
//! reference, and property setters reconstruct the concrete field type.
//!
//! Composite destinations live behind a [`Handle`] — a cheap-to-clone
//! shared reference owned by the top-level map call. Cyclic source graphs
//! are expressed with `Handle` fields too; back-references in the
//! destination graph come out reference-equal ([`Handle::ptr_eq`]).

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::error::ConvertError;

/// Shared reference to a type-erased instance.
#[derive(Clone)]
pub struct Handle(Rc<RefCell<dyn Any>>);

impl Handle {
    /// Wrap a value in a fresh shared instance.
    pub fn new<T: Any>(value: T) -> Self {
        Handle(Rc::new(RefCell::new(value)))
    }

    /// Whether two handles refer to the same instance.
    pub fn ptr_eq(a: &Handle, b: &Handle) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Whether the instance holds a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0.borrow().is::<T>()
    }

    /// Immutably borrow the instance as a `T`.
    pub fn borrow<T: Any>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.0.borrow(), |erased| erased.downcast_ref::<T>()).ok()
    }

    /// Mutably borrow the instance as a `T`.
    pub fn borrow_mut<T: Any>(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.0.borrow_mut(), |erased| erased.downcast_mut::<T>()).ok()
    }

    /// Erased shared borrow, for recursing into a shared source object.
    pub(crate) fn borrow_erased(&self) -> Ref<'_, dyn Any> {
        self.0.borrow()
    }

    /// Erased mutable borrow, for property setters.
    pub(crate) fn borrow_erased_mut(&self) -> RefMut<'_, dyn Any> {
        self.0.borrow_mut()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:p})", Rc::as_ptr(&self.0))
    }
}

/// Tagged, type-erased value.
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(String),
    /// Ordered sequence of erased elements.
    Seq(Vec<Value>),
    /// Owned snapshot of a nested source object.
    Object(Box<dyn Any>),
    /// Shared instance; carries destination objects and cycle
    /// back-references.
    Shared(Handle),
}

impl Value {
    /// Rendering used in conversion errors.
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Char(c) => format!("'{c}'"),
            Value::Str(s) => format!("{s:?}"),
            Value::Seq(items) => format!("<sequence of {}>", items.len()),
            Value::Object(_) => "<object>".to_string(),
            Value::Shared(_) => "<shared instance>".to_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Seq(items) => f.debug_tuple("Seq").field(&items.len()).finish(),
            Value::Object(_) => f.write_str("Object(..)"),
            Value::Shared(handle) => f.debug_tuple("Shared").field(handle).finish(),
            other => f.write_str(&other.describe()),
        }
    }
}

/// Erase a field value into its tagged form.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Reconstruct a concrete field value from its tagged form.
///
/// Implementations perform the mapper's value coercion: checked numeric
/// widening/narrowing and textual parsing for scalars, elementwise
/// conversion for sequences, downcasts for shared instances.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConvertError>;
}

impl ToValue for Handle {
    fn to_value(&self) -> Value {
        Value::Shared(self.clone())
    }
}

impl FromValue for Handle {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Shared(handle) => Ok(handle),
            other => Err(ConvertError::new(other.describe(), "shared instance")),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            None => Value::Null,
            Some(inner) => inner.to_value(),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ConvertError::new(other.describe(), "sequence")),
        }
    }
}

impl<T: ToValue> ToValue for VecDeque<T> {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for VecDeque<T> {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ConvertError::new(other.describe(), "sequence")),
        }
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue, const N: usize> FromValue for [T; N] {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            // Fixed-size destinations cannot be allocated with a runtime
            // length; cardinality must match exactly.
            Value::Seq(items) if items.len() == N => {
                let converted = items
                    .into_iter()
                    .map(T::from_value)
                    .collect::<Result<Vec<T>, ConvertError>>()?;
                converted
                    .try_into()
                    .map_err(|_| ConvertError::new("<sequence>", format!("array of {N}")))
            }
            Value::Seq(items) => Err(ConvertError::new(
                format!("<sequence of {}>", items.len()),
                format!("array of {N}"),
            )),
            other => Err(ConvertError::new(other.describe(), format!("array of {N}"))),
        }
    }
}

#[cfg(test)]
mod tests;
