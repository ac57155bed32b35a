use graft_types::TypeInfo;
use pretty_assertions::assert_eq;

use crate::error::MapError;
use crate::reflect_struct;

use super::*;

reflect_struct! {
    pub struct Person {
        pub name: String,
        pub age: i32,
    }
}

reflect_struct! {
    pub struct PersonView {
        pub name: String,
        pub age: i64,
    }
}

reflect_struct! {
    pub struct Badge {
        pub code: String,
    }
}

struct AnyContact;

impl TypeInfo for AnyContact {
    fn token() -> TypeToken {
        TypeToken::composite::<AnyContact>("AnyContact")
    }
}

// === Rules ===

#[test]
fn register_snapshots_both_schemas() {
    let mut registry = MappingRegistry::new();
    let rule = registry
        .register::<Person, PersonView>(RuleKind::Original)
        .map(|r| r.clone());
    let Ok(rule) = rule else {
        panic!("registration failed");
    };
    assert_eq!(rule.kind(), RuleKind::Original);
    assert_eq!(rule.from().name(), "Person");
    assert_eq!(rule.to().name(), "PersonView");
    assert_eq!(rule.from_schema().properties().len(), 2);
    assert!(rule.to_schema().property("age").is_some());
}

#[test]
fn custom_registration_keeps_its_kind() {
    let mut registry = MappingRegistry::new();
    let kind = registry
        .register::<Person, PersonView>(RuleKind::Custom)
        .map(|r| r.kind());
    assert_eq!(kind.ok(), Some(RuleKind::Custom));
}

#[test]
fn duplicate_pair_is_rejected_and_original_survives() {
    let mut registry = MappingRegistry::new();
    assert!(registry
        .register::<Person, PersonView>(RuleKind::Original)
        .is_ok());

    // The kind does not change the pair key.
    let duplicate = registry.register::<Person, PersonView>(RuleKind::Custom);
    assert!(matches!(
        duplicate.map(|_| ()),
        Err(MapError::DuplicateRule { .. })
    ));
    assert!(registry
        .rule(Person::token().id(), PersonView::token().id())
        .is_some());
}

#[test]
fn pairs_are_ordered() {
    let mut registry = MappingRegistry::new();
    assert!(registry
        .register::<Person, PersonView>(RuleKind::Original)
        .is_ok());
    // The reverse direction is a distinct pair.
    assert!(registry
        .register::<PersonView, Person>(RuleKind::Original)
        .is_ok());
}

#[test]
fn missing_rule_lookup_is_none() {
    let registry = MappingRegistry::new();
    assert!(registry
        .rule(Person::token().id(), Badge::token().id())
        .is_none());
}

// === Bindings ===

#[test]
fn first_interface_binding_wins() {
    let mut registry = MappingRegistry::new();
    registry.bind_interface::<AnyContact, Person>();
    registry.bind_interface::<AnyContact, Badge>();

    let bound = registry
        .binding(AnyContact::token().id())
        .map(|b| b.concrete.name().to_string());
    assert_eq!(bound, Some("Person".to_string()));
}

// === Hierarchies ===

#[test]
fn hierarchy_membership_with_duplicates() {
    let mut registry = MappingRegistry::new();
    let list = registry.hierarchy(Person::token().id());
    list.push(Badge::token());
    list.push(Badge::token());

    let Some(list) = registry.hierarchy_of(Person::token().id()) else {
        panic!("hierarchy missing");
    };
    assert_eq!(list.len(), 2);
    assert!(list.contains(Badge::token().id()));
    assert!(!list.contains(PersonView::token().id()));
}

#[test]
fn unconfigured_root_has_no_hierarchy() {
    let registry = MappingRegistry::new();
    assert!(registry.hierarchy_of(Person::token().id()).is_none());
}
