//! Object-graph mapping engine.
//!
//! `graft_map` maps a source object to a destination type by walking
//! registered per-type property schemas: properties are matched by name,
//! scalar values are coerced with range-checked numeric conversion and
//! textual parsing, nested composites and sequences are mapped
//! recursively, and cyclic references come out as reference-equal shared
//! back-edges rather than infinite recursion.
//!
//! Domain types declare their schema with [`reflect_struct!`]; rules,
//! interface bindings and hierarchy allow-lists are configured on a
//! [`Mapper`], which then maps through [`Mapper::map`],
//! [`Mapper::map_shared`], [`Mapper::map_handle`] and
//! [`Mapper::map_collection`].
//!
//! ```
//! use graft_map::{reflect_struct, Mapper};
//!
//! reflect_struct! {
//!     pub struct Person {
//!         pub name: String,
//!         pub age: i32,
//!     }
//! }
//!
//! reflect_struct! {
//!     pub struct PersonView {
//!         pub name: String,
//!         pub age: i64,
//!     }
//! }
//!
//! # fn main() -> Result<(), graft_map::MapError> {
//! let mut mapper = Mapper::new();
//! mapper.register::<Person, PersonView>()?;
//!
//! let source = Person { name: "ada".into(), age: 36 };
//! let view: PersonView = mapper.map(&source)?;
//! assert_eq!(view.age, 36);
//! # Ok(())
//! # }
//! ```

mod convert;
mod engine;
mod error;
mod guard;
mod registry;
mod schema;
mod value;

pub use engine::{HierarchyEntry, Mapper};
pub use error::{ConvertError, MapError};
pub use registry::{HierarchyAllowList, MappingRule, RuleKind};
pub use schema::{Getter, Property, Reflect, Setter, TypeSchema};
pub use value::{FromValue, Handle, ToValue, Value};

pub use graft_types::{
    Classifier, IterableCaps, OriginSignature, ScalarKind, SequenceKind, SequenceShape, TypeInfo,
    TypeToken,
};
