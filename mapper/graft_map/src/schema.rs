//! Per-type property schemas.
//!
//! The original runtime enumerated properties through ambient type
//! introspection at mapping time. Here every mappable composite type
//! registers an explicit schema once, at configuration time: an ordered
//! list of named properties with erased get/set accessors and the
//! declared [`TypeToken`] of each property. Nothing is introspected
//! again while mapping.
//!
//! Domain types normally obtain their schema through the
//! [`reflect_struct!`](crate::reflect_struct) macro rather than by hand.

use std::any::Any;

use graft_types::{TypeInfo, TypeToken};

use crate::error::ConvertError;
use crate::value::{Handle, Value};

/// Erased property read access. A mismatched receiver yields `Null`.
pub type Getter = fn(&dyn Any) -> Value;

/// Erased property write access; performs the final value coercion.
pub type Setter = fn(&mut dyn Any, Value) -> Result<(), ConvertError>;

/// One named property of a composite type.
#[derive(Clone)]
pub struct Property {
    name: &'static str,
    ty: TypeToken,
    get: Getter,
    set: Setter,
}

impl Property {
    pub fn new(name: &'static str, ty: fn() -> TypeToken, get: Getter, set: Setter) -> Self {
        Property {
            name,
            ty: ty(),
            get,
            set,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared type of the property.
    pub fn ty(&self) -> &TypeToken {
        &self.ty
    }

    /// Read this property off an erased source object.
    pub fn get(&self, source: &dyn Any) -> Value {
        (self.get)(source)
    }

    /// Write a value into this property of a shared destination.
    pub fn set(&self, destination: &Handle, value: Value) -> Result<(), ConvertError> {
        (self.set)(&mut *destination.borrow_erased_mut(), value)
    }
}

impl std::fmt::Debug for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("ty", &self.ty.name())
            .finish()
    }
}

/// Immutable snapshot of a type's properties.
#[derive(Clone, Debug)]
pub struct TypeSchema {
    token: TypeToken,
    properties: Vec<Property>,
}

impl TypeSchema {
    pub fn new(token: TypeToken, properties: Vec<Property>) -> Self {
        TypeSchema { token, properties }
    }

    pub fn token(&self) -> &TypeToken {
        &self.token
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A composite type that can participate in mapping.
///
/// Supplies the schema snapshot taken at rule registration and the
/// default-construction capability used to allocate destinations.
pub trait Reflect: TypeInfo + Any {
    /// Build this type's property schema.
    fn schema() -> TypeSchema;

    /// Default-construct a fresh shared instance.
    fn instantiate() -> Handle;
}

/// Declare a mappable domain struct.
///
/// Generates the struct itself (with `Clone`, `Debug`, `Default`) plus
/// `TypeInfo`, `Reflect`, `ToValue` and `FromValue` implementations. Each
/// field becomes a schema property under its own name.
///
/// A field may override its declared property type with `as OtherType`;
/// this is how type-erased [`Handle`] fields (used for cyclic links and
/// abstract destinations) declare the domain type they refer to:
///
/// ```
/// use graft_map::{reflect_struct, Handle};
///
/// reflect_struct! {
///     pub struct Node {
///         pub name: String,
///         pub next: Option<Handle> as Node,
///     }
/// }
/// ```
#[macro_export]
macro_rules! reflect_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty $(as $decl:ty)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default)]
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field : $fty, )*
        }

        impl $crate::TypeInfo for $name {
            fn token() -> $crate::TypeToken {
                $crate::TypeToken::composite::<$name>(stringify!($name))
            }
        }

        impl $crate::ToValue for $name {
            fn to_value(&self) -> $crate::Value {
                $crate::Value::Object(Box::new(self.clone()))
            }
        }

        impl $crate::FromValue for $name {
            fn from_value(value: $crate::Value) -> Result<Self, $crate::ConvertError> {
                match value {
                    $crate::Value::Object(object) => object
                        .downcast::<$name>()
                        .map(|boxed| *boxed)
                        .map_err(|_| $crate::ConvertError::new("<object>", stringify!($name))),
                    $crate::Value::Shared(handle) => handle
                        .borrow::<$name>()
                        .map(|instance| instance.clone())
                        .ok_or_else(|| {
                            $crate::ConvertError::new("<shared instance>", stringify!($name))
                        }),
                    other => Err($crate::ConvertError::new(other.describe(), stringify!($name))),
                }
            }
        }

        impl $crate::Reflect for $name {
            fn schema() -> $crate::TypeSchema {
                $crate::TypeSchema::new(
                    <$name as $crate::TypeInfo>::token(),
                    vec![
                        $(
                            $crate::Property::new(
                                stringify!($field),
                                $crate::declared_token!(($fty) $(as $decl)?),
                                |source| match source.downcast_ref::<$name>() {
                                    Some(object) => $crate::ToValue::to_value(&object.$field),
                                    None => $crate::Value::Null,
                                },
                                |destination, value| {
                                    let object = destination
                                        .downcast_mut::<$name>()
                                        .ok_or_else(|| $crate::ConvertError::new(
                                            value.describe(),
                                            stringify!($name),
                                        ))?;
                                    object.$field =
                                        <$fty as $crate::FromValue>::from_value(value)?;
                                    Ok(())
                                },
                            ),
                        )*
                    ],
                )
            }

            fn instantiate() -> $crate::Handle {
                $crate::Handle::new(<$name as Default>::default())
            }
        }
    };
}

/// Resolve the declared property token, honoring an `as` override.
#[doc(hidden)]
#[macro_export]
macro_rules! declared_token {
    (($fty:ty)) => {
        <$fty as $crate::TypeInfo>::token
    };
    (($fty:ty) as $decl:ty) => {
        <$decl as $crate::TypeInfo>::token
    };
}
