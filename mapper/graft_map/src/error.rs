//! Error taxonomy for mapping.
//!
//! Errors are never retried or recovered internally: any failure during a
//! graph traversal unwinds the entire top-level call, and no partial
//! destination graph is returned. Cycle resolution is not an error path.

use thiserror::Error;

/// A scalar value could not be coerced to its destination type.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot convert {value} to {to}")]
pub struct ConvertError {
    /// Rendering of the offending source value.
    pub value: String,
    /// Destination type name.
    pub to: String,
}

impl ConvertError {
    pub fn new(value: impl Into<String>, to: impl Into<String>) -> Self {
        ConvertError {
            value: value.into(),
            to: to.into(),
        }
    }
}

/// Failure of a mapping or configuration call.
#[derive(Clone, Debug, Error)]
pub enum MapError {
    /// Map requested for a type pair with no registered rule, where the
    /// pair is not trusted-origin on both sides.
    #[error("no mapping rule registered for {from} => {to}")]
    MissingRule { from: String, to: String },

    /// Register called twice for the same type pair. The original rule
    /// remains usable.
    #[error("mapping rule already registered for {from} => {to}")]
    DuplicateRule { from: String, to: String },

    /// A scalar value could not be coerced to its destination type.
    #[error(transparent)]
    Conversion(#[from] ConvertError),
}
