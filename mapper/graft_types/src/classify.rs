//! Sequence classification and origin trust.
//!
//! [`Classifier::classify`] resolves a token's declared capabilities into
//! a [`SequenceShape`] using a fixed precedence order. The order is an
//! external contract: generic capabilities win over legacy untyped ones,
//! and textual types never classify as sequences even though they satisfy
//! an iterable capability.
//!
//! Both classification and the trusted-origin decision are memoized per
//! `TypeId` for the lifetime of the classifier. Classification is pure, so
//! a cache hit always returns the stored value unchanged.

use std::any::TypeId;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::token::{IterableCaps, OriginSignature, TypeToken, ALLOC_ORIGIN, CORE_ORIGIN, STD_ORIGIN};

/// Resolved sequence category of a type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SequenceKind {
    /// Fixed-size positional storage.
    Array,
    /// Generic collection with a known element type.
    CollectionOf,
    /// Generic list with a known element type.
    ListOf,
    /// Generic sequence with a known element type.
    SequenceOf,
    /// Legacy sequence; no element-type narrowing available.
    UntypedSequence,
    /// Legacy collection; no element-type narrowing available.
    UntypedCollection,
    /// Legacy list; no element-type narrowing available.
    UntypedList,
    /// Not a sequence at all.
    NotASequence,
}

impl SequenceKind {
    /// Whether this is one of the legacy kinds without element typing.
    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            SequenceKind::UntypedSequence
                | SequenceKind::UntypedCollection
                | SequenceKind::UntypedList
        )
    }
}

/// Derived, cached fact about a type's sequence-ness.
#[derive(Clone, Debug)]
pub struct SequenceShape {
    pub is_sequence: bool,
    pub kind: SequenceKind,
    /// Element token for typed kinds; the container token itself for
    /// untyped kinds; `None` otherwise.
    pub element: Option<TypeToken>,
}

impl SequenceShape {
    fn not_a_sequence() -> Self {
        SequenceShape {
            is_sequence: false,
            kind: SequenceKind::NotASequence,
            element: None,
        }
    }
}

/// Signatures recognized as platform/standard-library origins.
const TRUSTED_SIGNATURES: [OriginSignature; 3] = [CORE_ORIGIN, STD_ORIGIN, ALLOC_ORIGIN];

/// Classification engine with process-lifetime memoization.
///
/// Constructed once and handed by reference to every consumer; there is
/// no implicit global instance. Caches only grow; classification is
/// stable for a given type.
#[derive(Default)]
pub struct Classifier {
    shapes: Mutex<FxHashMap<TypeId, SequenceShape>>,
    trusted: Mutex<FxHashMap<TypeId, bool>>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the sequence shape of `token`, memoized per type.
    pub fn classify(&self, token: &TypeToken) -> SequenceShape {
        let mut shapes = self.shapes.lock();
        if let Some(shape) = shapes.get(&token.id()) {
            return shape.clone();
        }
        let shape = Self::compute(token);
        shapes.insert(token.id(), shape.clone());
        shape
    }

    /// Whether `token` belongs to the trusted platform origin set.
    pub fn is_trusted(&self, token: &TypeToken) -> bool {
        let mut trusted = self.trusted.lock();
        if let Some(&known) = trusted.get(&token.id()) {
            return known;
        }
        let decision = TRUSTED_SIGNATURES.contains(&token.origin());
        trusted.insert(token.id(), decision);
        decision
    }

    /// Capability precedence, first match wins.
    fn compute(token: &TypeToken) -> SequenceShape {
        let caps = token.caps();
        let textual = caps.contains(IterableCaps::TEXTUAL);

        if caps.contains(IterableCaps::ARRAY) {
            return Self::typed(token, SequenceKind::Array);
        }
        if caps.contains(IterableCaps::COLLECTION_OF) {
            return Self::typed(token, SequenceKind::CollectionOf);
        }
        if caps.contains(IterableCaps::LIST_OF) {
            return Self::typed(token, SequenceKind::ListOf);
        }
        if caps.contains(IterableCaps::SEQUENCE_OF) && !textual {
            return Self::typed(token, SequenceKind::SequenceOf);
        }
        if caps.contains(IterableCaps::SEQUENCE) && !textual {
            return Self::untyped(token, SequenceKind::UntypedSequence);
        }
        if caps.contains(IterableCaps::COLLECTION) && !textual {
            return Self::untyped(token, SequenceKind::UntypedCollection);
        }
        if caps.contains(IterableCaps::LIST) && !textual {
            return Self::untyped(token, SequenceKind::UntypedList);
        }
        SequenceShape::not_a_sequence()
    }

    fn typed(token: &TypeToken, kind: SequenceKind) -> SequenceShape {
        SequenceShape {
            is_sequence: true,
            kind,
            element: token.element_token(),
        }
    }

    /// Degenerate shape: no element-type narrowing is available, so the
    /// container stands in for its own element.
    fn untyped(token: &TypeToken, kind: SequenceKind) -> SequenceShape {
        SequenceShape {
            is_sequence: true,
            kind,
            element: Some(token.clone()),
        }
    }
}
