//! Scoped activation tests
//!
//! `with_current` / `with_value` / `with_values` and guards must restore
//! the prior context on every exit path.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::common::fresh_thread;
use strata_context::{Context, ContextExt, ContextManager, Key};

#[derive(Debug, PartialEq)]
struct BodyError(&'static str);

#[test]
fn nested_attach_detach_restores_each_level() {
    fresh_thread();
    let k: Key<u8> = Key::new("level");
    let original = ContextManager::current();
    let c1 = original.set_value(&k, 1);
    let c2 = c1.set_value(&k, 2);

    ContextManager::attach(c1.clone());
    ContextManager::attach(c2.clone());
    assert_eq!(ContextManager::current(), c2);

    ContextManager::detach(None);
    assert_eq!(ContextManager::current(), c1);
    ContextManager::detach(None);
    assert_eq!(ContextManager::current(), original);
}

#[test]
fn with_value_error_propagates_and_restores() {
    fresh_thread();
    let k: Key<String> = Key::new("trace-id");
    let before = ContextManager::current();

    let result: Result<u32, BodyError> =
        ContextManager::with_value(&k, "abc".to_string(), |_, _| Err(BodyError("boom")));

    assert_eq!(result, Err(BodyError("boom")));
    assert_eq!(ContextManager::current(), before);
}

#[test]
fn with_value_panic_propagates_and_restores() {
    fresh_thread();
    let k: Key<String> = Key::new("trace-id");
    let before = ContextManager::current();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        ContextManager::with_value(&k, "abc".to_string(), |_, _| -> () {
            panic!("boom");
        })
    }));

    let payload = outcome.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));
    assert_eq!(ContextManager::current(), before);
    assert_eq!(ContextManager::depth(), 0);
}

#[test]
fn with_values_panic_restores() {
    fresh_thread();
    let a: Key<u8> = Key::new("a");

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        ContextManager::with_values([a.entry(1)], |_| -> () { panic!("boom") })
    }));

    assert!(outcome.is_err());
    assert!(ContextManager::value(&a).is_none());
}

#[test]
fn question_mark_inside_body() {
    fresh_thread();
    let k: Key<u32> = Key::new("limit");

    fn parse_with_limit(input: &str, limit: &Key<u32>) -> Result<u32, std::num::ParseIntError> {
        let n: u32 = input.parse()?;
        Ok(n.min(ContextManager::value(limit).map_or(u32::MAX, |v| *v)))
    }

    let ok = ContextManager::with_value(&k, 10, |_, _| parse_with_limit("42", &k));
    let err = ContextManager::with_value(&k, 10, |_, _| parse_with_limit("nope", &k));

    assert_eq!(ok, Ok(10));
    assert!(err.is_err());
    assert_eq!(ContextManager::depth(), 0);
}

#[test]
fn guard_restores_at_scope_end() {
    fresh_thread();
    let k: Key<u8> = Key::new("k");
    {
        let _guard = Context::root().set_value(&k, 1).attach();
        assert_eq!(ContextManager::value(&k).as_deref(), Some(&1));
    }
    assert!(ContextManager::value(&k).is_none());
}
