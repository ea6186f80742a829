//! Test fixtures
//!
//! Factory functions for creating fixture definitions with sensible defaults.
//! Each definition records what happened to it in a shared `EventLog` so tests
//! can assert on initialization and cleanup order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::entities::{FactoryResult, FixtureDefinition, FixtureInstance};

/// Ordered record of factory and hook invocations
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Value produced by the recording fixtures
#[derive(Debug)]
pub struct TestResource {
    pub name: String,
    /// Incremented on every factory run, so rebuilt instances are distinguishable
    pub serial: usize,
}

/// A fixture that logs `init:<name>` when built and `close:<name>` when its
/// `close` hook runs
pub fn recording_fixture(name: &str, log: &EventLog) -> FixtureDefinition {
    hooked_fixture(name, &[("close", true)], log)
}

/// A fixture with the given hooks, each logging `<hook>:<name>` and
/// returning the paired success flag. Hooks are declared in the given order.
pub fn hooked_fixture(name: &str, hooks: &[(&str, bool)], log: &EventLog) -> FixtureDefinition {
    let fixture_name = name.to_string();
    let hooks: Vec<(String, bool)> = hooks
        .iter()
        .map(|(hook, ok)| (hook.to_string(), *ok))
        .collect();
    let hook_names: Vec<String> = hooks.iter().map(|(hook, _)| hook.clone()).collect();
    let log = log.clone();
    let serial = Arc::new(AtomicUsize::new(0));

    FixtureDefinition::new(name, move || {
        let name = fixture_name.clone();
        let hooks = hooks.clone();
        let log = log.clone();
        let serial = serial.fetch_add(1, Ordering::SeqCst) + 1;

        async move {
            log.lock().unwrap().push(format!("init:{}", name));

            let mut instance = FixtureInstance::new(TestResource {
                name: name.clone(),
                serial,
            });
            for (hook, ok) in hooks {
                let hook_log = log.clone();
                let label = hook.clone();
                instance = instance.with_hook(hook, move |resource: Arc<TestResource>| {
                    let log = hook_log.clone();
                    let label = label.clone();
                    async move {
                        log.lock()
                            .unwrap()
                            .push(format!("{}:{}", label, resource.name));
                        ok
                    }
                });
            }

            let result: FactoryResult = Ok(Some(instance));
            result
        }
    })
    .with_cleanup_hooks(hook_names)
}

/// A fixture whose factory succeeds but produces nothing
pub fn empty_fixture(name: &str) -> FixtureDefinition {
    FixtureDefinition::from_fn(name, || Ok(None))
}

/// A fixture whose factory returns an error
pub fn failing_fixture(name: &str) -> FixtureDefinition {
    FixtureDefinition::from_fn(name, || Err("connection refused".into()))
}

/// A fixture producing a clone of `value` on every build
pub fn value_fixture<T>(name: &str, value: T) -> FixtureDefinition
where
    T: Clone + Send + Sync + 'static,
{
    FixtureDefinition::from_fn(name, move || Ok(Some(FixtureInstance::new(value.clone()))))
}
