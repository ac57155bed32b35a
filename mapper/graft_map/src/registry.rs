//! Configured mapping rules, hierarchies and destination bindings.
//!
//! The registry is append-only during configuration and read-only while
//! mapping; the engine exposes configuration through `&mut self` methods
//! and mapping through `&self`, so the phases cannot overlap within safe
//! code. Everything here is keyed by `TypeId`.

use std::any::TypeId;

use graft_types::{TypeInfo, TypeToken};
use rustc_hash::FxHashMap;

use crate::error::MapError;
use crate::schema::{Reflect, TypeSchema};
use crate::value::Handle;

/// Provenance of a mapping rule.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RuleKind {
    /// Created by a plain `register` call.
    Original,
    /// Created by `register_custom`; the caller supplies its own
    /// conversion on top of the rule.
    Custom,
}

/// A configured (source, destination) conversion rule.
///
/// Snapshots both property schemas at registration time; the snapshot is
/// immutable for the lifetime of the engine.
#[derive(Clone, Debug)]
pub struct MappingRule {
    from: TypeToken,
    to: TypeToken,
    kind: RuleKind,
    from_schema: TypeSchema,
    to_schema: TypeSchema,
    construct: fn() -> Handle,
}

impl MappingRule {
    fn of<From: Reflect, To: Reflect>(kind: RuleKind) -> Self {
        MappingRule {
            from: From::token(),
            to: To::token(),
            kind,
            from_schema: From::schema(),
            to_schema: To::schema(),
            construct: To::instantiate,
        }
    }

    pub fn from(&self) -> &TypeToken {
        &self.from
    }

    pub fn to(&self) -> &TypeToken {
        &self.to
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn from_schema(&self) -> &TypeSchema {
        &self.from_schema
    }

    pub fn to_schema(&self) -> &TypeSchema {
        &self.to_schema
    }

    /// Default-construct the declared destination type.
    pub(crate) fn construct(&self) -> Handle {
        (self.construct)()
    }
}

/// Abstract-destination binding: what to instantiate, and the schema to
/// synchronize through, when the declared destination cannot be
/// constructed directly.
#[derive(Clone, Debug)]
pub(crate) struct InterfaceBinding {
    pub(crate) concrete: TypeToken,
    pub(crate) schema: TypeSchema,
    pub(crate) construct: fn() -> Handle,
}

/// Ordered allow-list of nested types permitted under one root.
///
/// Append-only; duplicates are permitted. Membership, not list content,
/// is the observable contract.
#[derive(Clone, Debug, Default)]
pub struct HierarchyAllowList {
    included: Vec<TypeToken>,
}

impl HierarchyAllowList {
    /// Append a type unconditionally.
    pub(crate) fn push(&mut self, token: TypeToken) {
        self.included.push(token);
    }

    /// Whether the given type has been included.
    pub fn contains(&self, id: TypeId) -> bool {
        self.included.iter().any(|token| token.id() == id)
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.included.len()
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}

/// Holds every configured conversion rule, hierarchy and binding.
#[derive(Default)]
pub(crate) struct MappingRegistry {
    rules: FxHashMap<(TypeId, TypeId), MappingRule>,
    bindings: FxHashMap<TypeId, InterfaceBinding>,
    hierarchies: FxHashMap<TypeId, HierarchyAllowList>,
}

impl MappingRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a conversion rule for the pair, snapshotting both
    /// schemas now. At most one rule per ordered pair, whatever its kind.
    pub(crate) fn register<From: Reflect, To: Reflect>(
        &mut self,
        kind: RuleKind,
    ) -> Result<&MappingRule, MapError> {
        let rule = MappingRule::of::<From, To>(kind);
        let key = (rule.from.id(), rule.to.id());
        if let Some(existing) = self.rules.get(&key) {
            return Err(MapError::DuplicateRule {
                from: existing.from.name().to_string(),
                to: existing.to.name().to_string(),
            });
        }
        tracing::debug!(from = rule.from.name(), to = rule.to.name(), "rule registered");
        Ok(self.rules.entry(key).or_insert(rule))
    }

    pub(crate) fn rule(&self, from: TypeId, to: TypeId) -> Option<&MappingRule> {
        self.rules.get(&(from, to))
    }

    /// Bind an abstract destination type to a concrete implementation.
    /// The first binding for a given abstract type wins.
    pub(crate) fn bind_interface<Abstract: TypeInfo, Concrete: Reflect>(&mut self) {
        let key = Abstract::token().id();
        if self.bindings.contains_key(&key) {
            return;
        }
        self.bindings.insert(
            key,
            InterfaceBinding {
                concrete: Concrete::token(),
                schema: Concrete::schema(),
                construct: Concrete::instantiate,
            },
        );
    }

    pub(crate) fn binding(&self, to: TypeId) -> Option<&InterfaceBinding> {
        self.bindings.get(&to)
    }

    /// Fetch or lazily create the allow-list for a root type.
    pub(crate) fn hierarchy(&mut self, root: TypeId) -> &mut HierarchyAllowList {
        self.hierarchies.entry(root).or_default()
    }

    pub(crate) fn hierarchy_of(&self, root: TypeId) -> Option<&HierarchyAllowList> {
        self.hierarchies.get(&root)
    }
}

#[cfg(test)]
mod tests;
