//! Type identity and classification for the graft object-graph mapper.
//!
//! Rust has no ambient reflection, so every type that participates in
//! mapping describes itself through a [`TypeToken`]: a runtime identity
//! carrying the display name, the origin signature of the component that
//! defines the type, an optional scalar kind, and the iterable
//! capabilities the type satisfies.
//!
//! The [`Classifier`] turns those declared capabilities into a
//! [`SequenceShape`] using a fixed precedence order, and decides whether a
//! type belongs to the trusted platform origin set. Both decisions are
//! memoized per `TypeId` for the lifetime of the classifier.

mod classify;
mod token;

pub use classify::{Classifier, SequenceKind, SequenceShape};
pub use token::{
    IterableCaps, OriginSignature, ScalarKind, TypeInfo, TypeToken, ALLOC_ORIGIN, CORE_ORIGIN,
    STD_ORIGIN,
};
