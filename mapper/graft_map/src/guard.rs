//! Cycle detection for in-flight traversals.
//!
//! While the engine recurses into a composite property it pushes an
//! [`ExecutionFrame`] recording the enclosing source object and the
//! destination instance under construction. A source value that is
//! reference-equal to any recorded source resolves to that frame's
//! destination: the cycle is reconstructed as a shared back-reference
//! instead of being traversed again.
//!
//! Frames are keyed by source *identity*, not by type, and the whole
//! in-flight chain is consulted. A type-keyed check of only the innermost
//! frame would fold every same-type chain at depth two and still loop on
//! cycles through a grandparent; identity keying handles both.
//!
//! Pushing returns an RAII guard so the paired pop runs on every exit
//! path, including error unwinds. The stack is engine-instance state:
//! interleaving two traversals through one guard corrupts detection for
//! both, which is why the engine is single-traversal by construction.

use std::cell::RefCell;

use graft_types::TypeToken;
use smallvec::SmallVec;

use crate::value::{Handle, Value};

/// One level of the in-flight construction chain.
#[derive(Debug)]
struct ExecutionFrame {
    /// Type of the enclosing source object; recorded for diagnostics.
    owner: TypeToken,
    /// Identity of the enclosing source object, when it is shared.
    /// Plain owned sources cannot alias and carry no identity.
    source: Option<Handle>,
    /// Destination instance being constructed at this level. Shared with
    /// the top-level map call that owns it.
    destination: Handle,
}

/// Call-stack-shaped record of the objects currently being constructed.
#[derive(Default)]
pub(crate) struct CycleGuard {
    frames: RefCell<SmallVec<[ExecutionFrame; 8]>>,
}

impl CycleGuard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Push a frame for the duration of a recursive call.
    pub(crate) fn enter(
        &self,
        owner: TypeToken,
        source: Option<Handle>,
        destination: Handle,
    ) -> FrameGuard<'_> {
        self.frames.borrow_mut().push(ExecutionFrame {
            owner,
            source,
            destination,
        });
        FrameGuard { guard: self }
    }

    /// Resolve a source value against the in-flight chain.
    ///
    /// Returns the destination under construction for the matching
    /// ancestor, newest frame first.
    pub(crate) fn resolve(&self, value: &Value) -> Option<Handle> {
        let Value::Shared(candidate) = value else {
            return None;
        };
        let frames = self.frames.borrow();
        for frame in frames.iter().rev() {
            if let Some(source) = &frame.source {
                if Handle::ptr_eq(source, candidate) {
                    tracing::trace!(owner = frame.owner.name(), "cycle resolved to ancestor");
                    return Some(frame.destination.clone());
                }
            }
        }
        None
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.borrow().len()
    }
}

/// Pops its frame when dropped, on success and failure paths alike.
pub(crate) struct FrameGuard<'a> {
    guard: &'a CycleGuard,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.guard.frames.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests;
