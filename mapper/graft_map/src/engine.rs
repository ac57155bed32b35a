//! The mapping engine.
//!
//! A [`Mapper`] is configured once (rules, interface bindings, hierarchy
//! allow-lists) and then maps source objects to destination instances by
//! walking registered property schemas: matching properties by name,
//! coercing scalars, recursing into nested composites and sequences, and
//! resolving cyclic back-references through the in-flight frame stack.
//!
//! Configuration methods take `&mut self` and mapping methods take
//! `&self`, so the append-only-then-read-only registry contract is a
//! compile-time property. The cycle guard makes a `Mapper` single-
//! traversal; concurrent call trees each get their own engine.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};

use graft_types::{Classifier, SequenceShape, TypeInfo, TypeToken};
use rustc_hash::FxHashMap;

use crate::convert;
use crate::error::MapError;
use crate::guard::CycleGuard;
use crate::registry::{MappingRegistry, MappingRule, RuleKind};
use crate::schema::{Property, Reflect, TypeSchema};
use crate::value::{FromValue, Handle, ToValue, Value};

/// Object-graph mapper: registered rules plus the traversal machinery.
pub struct Mapper {
    registry: MappingRegistry,
    classifier: Classifier,
    guard: CycleGuard,
    /// Memoized allowed-conversion decisions, keyed by (root, candidate).
    policy: RefCell<FxHashMap<(TypeId, TypeId), bool>>,
    allow_only_included: Cell<bool>,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    pub fn new() -> Self {
        Mapper {
            registry: MappingRegistry::new(),
            classifier: Classifier::new(),
            guard: CycleGuard::new(),
            policy: RefCell::new(FxHashMap::default()),
            allow_only_included: Cell::new(true),
        }
    }

    // === Configuration ===

    /// Register a conversion rule for the ordered pair `(From, To)`,
    /// returning the created rule.
    ///
    /// Both property schemas and the destination constructor are
    /// snapshotted now; later edits to the types' `Reflect` impls are not
    /// observed. A second registration for the same pair fails with
    /// [`MapError::DuplicateRule`] and leaves the original rule usable.
    pub fn register<From: Reflect, To: Reflect>(&mut self) -> Result<&MappingRule, MapError> {
        self.registry.register::<From, To>(RuleKind::Original)
    }

    /// Register a caller-adjusted conversion rule for the pair.
    ///
    /// Identical to [`Mapper::register`] except the rule is marked
    /// [`RuleKind::Custom`]. The pair still admits only one rule.
    pub fn register_custom<From: Reflect, To: Reflect>(
        &mut self,
    ) -> Result<&MappingRule, MapError> {
        self.registry.register::<From, To>(RuleKind::Custom)
    }

    /// Bind an abstract destination type to a concrete implementation.
    ///
    /// Mapping calls that name `Abstract` as their destination construct
    /// a `Concrete` and synchronize through its schema. The first binding
    /// for a given abstract type wins; later bindings are ignored.
    pub fn bind_interface<Abstract: TypeInfo, Concrete: Reflect>(&mut self) {
        self.registry.bind_interface::<Abstract, Concrete>();
    }

    /// Access the hierarchy allow-list rooted at `Root`, creating it on
    /// first use.
    pub fn hierarchy<Root: TypeInfo>(&mut self) -> HierarchyEntry<'_> {
        let root = Root::token().id();
        self.registry.hierarchy(root);
        HierarchyEntry { mapper: self, root }
    }

    /// Global policy toggle: when `true` (the default), untrusted nested
    /// types map only if the root's hierarchy allow-list includes them.
    ///
    /// Affects subsequent policy-cache misses only; decisions already
    /// memoized keep their old answer until [`Mapper::clear_policy_cache`].
    pub fn set_allow_only_included_types(&mut self, allow: bool) {
        self.allow_only_included.set(allow);
    }

    /// Drop every memoized allowed-conversion decision.
    pub fn clear_policy_cache(&mut self) {
        self.policy.get_mut().clear();
    }

    // === Mapping ===

    /// Map a source object to a fresh destination value.
    ///
    /// When both types carry a trusted origin the value is coerced
    /// directly, with no registry lookup and no recursion. Otherwise the
    /// registered rule for the pair drives a member-by-member
    /// synchronization into a default-constructed destination.
    pub fn map<From, To>(&self, source: &From) -> Result<To, MapError>
    where
        From: TypeInfo + ToValue + Any,
        To: TypeInfo + FromValue,
    {
        let from = From::token();
        let to = To::token();
        if self.classifier.is_trusted(&from) && self.classifier.is_trusted(&to) {
            tracing::trace!(from = from.name(), to = to.name(), "trusted pair, direct coercion");
            let coerced = convert::coerce(source.to_value(), &to)?;
            return Ok(To::from_value(coerced)?);
        }
        let destination = self.map_erased(source, None, &from, &to)?;
        Ok(To::from_value(Value::Shared(destination))?)
    }

    /// Map a source object, returning the shared destination instance.
    ///
    /// Same traversal as [`Mapper::map`] without the final clone-out, so
    /// callers mapping cyclic graphs can observe reference-equal
    /// back-edges, and so abstract destination types (which cannot be
    /// returned by value) can be mapped at the top level.
    pub fn map_shared<From, To>(&self, source: &From) -> Result<Handle, MapError>
    where
        From: TypeInfo + Any,
        To: TypeInfo,
    {
        self.map_erased(source, None, &From::token(), &To::token())
    }

    /// Map a shared source instance, returning the shared destination.
    ///
    /// The entry point for cyclic source graphs: a back-reference to
    /// `source` anywhere in the graph resolves to the destination under
    /// construction instead of recursing forever.
    pub fn map_handle<From, To>(&self, source: &Handle) -> Result<Handle, MapError>
    where
        From: TypeInfo,
        To: TypeInfo,
    {
        let borrowed = source.borrow_erased();
        self.map_erased(&*borrowed, Some(source), &From::token(), &To::token())
    }

    /// Map every element of a slice, preserving order and cardinality.
    pub fn map_collection<From, To>(&self, source: &[From]) -> Result<Vec<To>, MapError>
    where
        From: TypeInfo + ToValue + Any,
        To: TypeInfo + FromValue,
    {
        source.iter().map(|item| self.map(item)).collect()
    }

    // === Traversal ===

    /// Rule-driven mapping of an erased source to a fresh destination.
    fn map_erased(
        &self,
        source: &dyn Any,
        source_handle: Option<&Handle>,
        from: &TypeToken,
        to: &TypeToken,
    ) -> Result<Handle, MapError> {
        let binding = self.registry.binding(to.id());
        let effective_to = binding.map_or(to, |b| &b.concrete);
        let rule = self
            .registry
            .rule(from.id(), effective_to.id())
            .ok_or_else(|| MapError::MissingRule {
                from: from.name().to_string(),
                to: to.name().to_string(),
            })?;
        tracing::debug!(from = from.name(), to = to.name(), "mapping via rule");

        let (destination, dest_schema) = match binding {
            Some(bound) => ((bound.construct)(), &bound.schema),
            None => (rule.construct(), rule.to_schema()),
        };
        let _frame = self
            .guard
            .enter(from.clone(), source_handle.cloned(), destination.clone());
        self.sync_members(rule, dest_schema, source, &destination)?;
        Ok(destination)
    }

    /// Walk the source schema and populate name-matched destination
    /// properties.
    fn sync_members(
        &self,
        rule: &MappingRule,
        dest_schema: &TypeSchema,
        source: &dyn Any,
        destination: &Handle,
    ) -> Result<(), MapError> {
        for src_prop in rule.from_schema().properties() {
            if !self.conversion_allowed(rule.from(), src_prop.ty()) {
                tracing::trace!(
                    property = src_prop.name(),
                    ty = src_prop.ty().name(),
                    "skipped by policy"
                );
                continue;
            }
            let Some(dst_prop) = dest_schema.property(src_prop.name()) else {
                continue;
            };
            self.sync_property(src_prop, dst_prop, source, destination)?;
        }
        Ok(())
    }

    /// Synchronize one name-matched property pair.
    fn sync_property(
        &self,
        src_prop: &Property,
        dst_prop: &Property,
        source: &dyn Any,
        destination: &Handle,
    ) -> Result<(), MapError> {
        let value = src_prop.get(source);

        // Absent source values leave the destination default in place.
        if matches!(value, Value::Null) {
            return Ok(());
        }

        // A source instance already on the in-flight chain is a cycle:
        // reuse the ancestor's destination instead of recursing.
        if let Some(back) = self.guard.resolve(&value) {
            dst_prop.set(destination, Value::Shared(back))?;
            return Ok(());
        }

        let src_shape = self.classifier.classify(src_prop.ty());
        let dst_shape = self.classifier.classify(dst_prop.ty());

        // Sequences without element-type information cannot be mapped
        // automatically.
        if src_shape.kind.is_untyped() {
            tracing::trace!(property = src_prop.name(), "untyped sequence source skipped");
            return Ok(());
        }

        if src_prop.ty().scalar().is_some() && dst_prop.ty().scalar().is_some() {
            let coerced = convert::coerce(value, dst_prop.ty())?;
            dst_prop.set(destination, coerced)?;
            return Ok(());
        }

        if src_shape.is_sequence && dst_shape.is_sequence {
            return self.sync_sequence(value, &src_shape, &dst_shape, dst_prop, destination);
        }

        if !src_shape.is_sequence
            && !dst_shape.is_sequence
            && !self.classifier.is_trusted(src_prop.ty())
            && !self.classifier.is_trusted(dst_prop.ty())
        {
            return self.sync_composite(value, src_prop, dst_prop, destination);
        }

        // No compatible treatment; the destination keeps its default.
        tracing::trace!(
            property = src_prop.name(),
            from = src_prop.ty().name(),
            to = dst_prop.ty().name(),
            "no compatible treatment, destination left at default"
        );
        Ok(())
    }

    /// Recurse into a nested composite property value.
    fn sync_composite(
        &self,
        value: Value,
        src_prop: &Property,
        dst_prop: &Property,
        destination: &Handle,
    ) -> Result<(), MapError> {
        let from = unwrap_nullable(src_prop.ty());
        let to = unwrap_nullable(dst_prop.ty());
        let mapped = match value {
            Value::Object(object) => self.map_erased(&*object, None, &from, &to)?,
            Value::Shared(handle) => {
                let borrowed = handle.borrow_erased();
                self.map_erased(&*borrowed, Some(&handle), &from, &to)?
            }
            other => {
                return Err(MapError::Conversion(crate::error::ConvertError::new(
                    other.describe(),
                    to.name(),
                )))
            }
        };
        dst_prop.set(destination, Value::Shared(mapped))?;
        Ok(())
    }

    /// Map a sequence property element by element, preserving order.
    fn sync_sequence(
        &self,
        value: Value,
        src_shape: &SequenceShape,
        dst_shape: &SequenceShape,
        dst_prop: &Property,
        destination: &Handle,
    ) -> Result<(), MapError> {
        let (Some(src_elem), Some(dst_elem)) = (&src_shape.element, &dst_shape.element) else {
            return Ok(());
        };
        let Value::Seq(items) = value else {
            return Ok(());
        };
        let mapped = items
            .into_iter()
            .map(|item| self.map_element(item, src_elem, dst_elem))
            .collect::<Result<Vec<Value>, MapError>>()?;
        dst_prop.set(destination, Value::Seq(mapped))?;
        Ok(())
    }

    /// Map one sequence element: trusted pairs coerce, composites recurse.
    fn map_element(
        &self,
        item: Value,
        src_elem: &TypeToken,
        dst_elem: &TypeToken,
    ) -> Result<Value, MapError> {
        if self.classifier.is_trusted(src_elem) && self.classifier.is_trusted(dst_elem) {
            return Ok(convert::coerce(item, dst_elem)?);
        }
        if let Some(back) = self.guard.resolve(&item) {
            return Ok(Value::Shared(back));
        }
        let mapped = match item {
            Value::Null => return Ok(Value::Null),
            Value::Object(object) => self.map_erased(&*object, None, src_elem, dst_elem)?,
            Value::Shared(handle) => {
                let borrowed = handle.borrow_erased();
                self.map_erased(&*borrowed, Some(&handle), src_elem, dst_elem)?
            }
            other => {
                return Err(MapError::Conversion(crate::error::ConvertError::new(
                    other.describe(),
                    dst_elem.name(),
                )))
            }
        };
        Ok(Value::Shared(mapped))
    }

    // === Policy ===

    /// Whether `candidate` (reduced to its element type for sequences)
    /// may be auto-mapped under `root`. Memoized per (root, candidate).
    fn conversion_allowed(&self, root: &TypeToken, candidate: &TypeToken) -> bool {
        let reduced = self.reduce_candidate(candidate);
        let key = (root.id(), reduced.id());
        if let Some(&known) = self.policy.borrow().get(&key) {
            return known;
        }
        let allowed = self.classifier.is_trusted(&reduced)
            || !self.allow_only_included.get()
            || self
                .registry
                .hierarchy_of(root.id())
                .is_some_and(|list| list.contains(reduced.id()));
        self.policy.borrow_mut().insert(key, allowed);
        allowed
    }

    /// Strip nullable wrappers, then reduce typed sequences to their
    /// element type. Untyped sequences stand in for themselves.
    fn reduce_candidate(&self, candidate: &TypeToken) -> TypeToken {
        let unwrapped = unwrap_nullable(candidate);
        let shape = self.classifier.classify(&unwrapped);
        if shape.is_sequence && !shape.kind.is_untyped() {
            if let Some(element) = shape.element {
                return element;
            }
        }
        unwrapped
    }
}

/// Peel a nullable wrapper down to its payload token.
fn unwrap_nullable(token: &TypeToken) -> TypeToken {
    token.inner_token().unwrap_or_else(|| token.clone())
}

/// Chainable handle onto one hierarchy allow-list.
///
/// Including a type invalidates the engine's memoized policy decisions so
/// the next mapping call observes the new membership.
pub struct HierarchyEntry<'a> {
    mapper: &'a mut Mapper,
    root: TypeId,
}

impl HierarchyEntry<'_> {
    /// Append `T` to the allow-list. Duplicates are kept.
    pub fn include<T: TypeInfo>(self) -> Self {
        self.mapper.registry.hierarchy(self.root).push(T::token());
        self.mapper.policy.get_mut().clear();
        self
    }
}
