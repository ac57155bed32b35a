use graft_types::{TypeInfo, TypeToken};
use pretty_assertions::assert_eq;

use super::*;

#[derive(Clone, Debug, Default)]
struct Node;

impl TypeInfo for Node {
    fn token() -> TypeToken {
        TypeToken::composite::<Node>("Node")
    }
}

fn handle() -> Handle {
    Handle::new(Node)
}

// === Stack discipline ===

#[test]
fn enter_pushes_and_drop_pops() {
    let guard = CycleGuard::new();
    assert_eq!(guard.depth(), 0);
    {
        let _outer = guard.enter(Node::token(), None, handle());
        assert_eq!(guard.depth(), 1);
        {
            let _inner = guard.enter(Node::token(), None, handle());
            assert_eq!(guard.depth(), 2);
        }
        assert_eq!(guard.depth(), 1);
    }
    assert_eq!(guard.depth(), 0);
}

#[test]
fn frame_is_released_on_early_exit() {
    fn failing(guard: &CycleGuard) -> Result<(), ()> {
        let _frame = guard.enter(Node::token(), None, handle());
        Err(())
    }

    let guard = CycleGuard::new();
    assert!(failing(&guard).is_err());
    assert_eq!(guard.depth(), 0);
}

// === Resolution ===

#[test]
fn resolves_immediate_parent_by_identity() {
    let guard = CycleGuard::new();
    let source = handle();
    let destination = handle();
    let _frame = guard.enter(Node::token(), Some(source.clone()), destination.clone());

    let back = guard.resolve(&Value::Shared(source));
    assert!(back.is_some_and(|b| Handle::ptr_eq(&b, &destination)));
}

#[test]
fn resolves_grandparent_in_the_chain() {
    let guard = CycleGuard::new();
    let grandparent = handle();
    let parent = handle();
    let d1 = handle();
    let d2 = handle();
    let _outer = guard.enter(Node::token(), Some(grandparent.clone()), d1.clone());
    let _inner = guard.enter(Node::token(), Some(parent), d2);

    let back = guard.resolve(&Value::Shared(grandparent));
    assert!(back.is_some_and(|b| Handle::ptr_eq(&b, &d1)));
}

#[test]
fn distinct_instances_of_same_type_do_not_match() {
    let guard = CycleGuard::new();
    let _frame = guard.enter(Node::token(), Some(handle()), handle());

    // Same type, different instance: no cycle.
    assert!(guard.resolve(&Value::Shared(handle())).is_none());
}

#[test]
fn owned_sources_never_resolve() {
    let guard = CycleGuard::new();
    let _frame = guard.enter(Node::token(), None, handle());

    assert!(guard.resolve(&Value::Object(Box::new(Node))).is_none());
    assert!(guard.resolve(&Value::Int(1)).is_none());
}

#[test]
fn empty_chain_resolves_nothing() {
    let guard = CycleGuard::new();
    assert!(guard.resolve(&Value::Shared(handle())).is_none());
}
