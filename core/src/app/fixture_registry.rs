//! Fixture registry
//!
//! Registers named fixture factories, builds them lazily on first access in
//! dependency order, and tears them down in reverse registration order.
//!
//! Resolution is depth-first. The outermost `get` holds the resolution lock
//! for the whole walk, and the names on the current walk travel with it as a
//! task-local chain, so a fixture requested again by its own walk is a
//! cycle no matter what its state says. Concurrent callers queue on the lock
//! and find the finished instance. Every state transition is made under the
//! registry lock *before* awaiting a factory or hook.
//!
//! Each build carries a generation number. `cleanup` and `reset` bump it, so
//! a build that was interrupted while its factory ran discards its result
//! instead of publishing it.
//!
//! A fixture abandoned mid-initialization (for example by a per-test timeout
//! dropping the future) stays `Initializing` until it is reset or cleaned up.

use std::collections::HashMap;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

use crate::domain::entities::{FixtureDefinition, FixtureFactory, FixtureInstance, FixtureState};
use crate::error::FixtureError;

tokio::task_local! {
    /// Fixtures being resolved by the current walk, outermost first
    static RESOLVING: Vec<String>;
}

struct FixtureEntry {
    factory: FixtureFactory,
    dependencies: Vec<String>,
    cleanup_hooks: Vec<String>,
    state: FixtureState,
    instance: Option<FixtureInstance>,
    /// Bumped when a build starts and when cleanup or reset interrupts one
    generation: u64,
}

#[derive(Default)]
struct RegistryInner {
    fixtures: HashMap<String, FixtureEntry>,
    /// Registration order, drives `cleanup_all`
    order: Vec<String>,
}

/// Snapshot taken when a build starts
struct Build {
    generation: u64,
    factory: FixtureFactory,
    dependencies: Vec<String>,
    cleanup_hooks: Vec<String>,
}

/// Owns every fixture of one test suite
#[derive(Default)]
pub struct FixtureRegistry {
    inner: Mutex<RegistryInner>,
    /// Held by the outermost `get` for its whole dependency walk
    resolution: tokio::sync::Mutex<()>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture, replacing any existing registration of the same
    /// name. A replaced fixture keeps its current state and instance; only
    /// its factory, dependencies and hooks change.
    pub fn register(&self, definition: FixtureDefinition) {
        let FixtureDefinition {
            name,
            factory,
            dependencies,
            cleanup_hooks,
        } = definition;

        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match inner.fixtures.get_mut(&name) {
            Some(entry) => {
                tracing::warn!(
                    fixture = %name,
                    state = %entry.state,
                    "Fixture already registered, overwriting definition"
                );
                entry.factory = factory;
                entry.dependencies = dependencies;
                entry.cleanup_hooks = cleanup_hooks;
            }
            None => {
                tracing::debug!(fixture = %name, dependencies = ?dependencies, "Fixture registered");
                inner.order.push(name.clone());
                inner.fixtures.insert(
                    name,
                    FixtureEntry {
                        factory,
                        dependencies,
                        cleanup_hooks,
                        state: FixtureState::Uninitialized,
                        instance: None,
                        generation: 0,
                    },
                );
            }
        }
    }

    /// Get a fixture instance, building it and its dependencies on first use.
    ///
    /// Calls made from inside a factory join the walk that is running it. A
    /// factory that spawns a separate task to call `get` and then awaits that
    /// task waits forever on the resolution lock.
    pub fn get<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<FixtureInstance, FixtureError>> {
        async move {
            match RESOLVING.try_with(|chain| chain.clone()) {
                Ok(chain) => self.resolve(name, chain).await,
                Err(_) => {
                    let _walk = self.resolution.lock().await;
                    self.resolve(name, Vec::new()).await
                }
            }
        }
        .boxed()
    }

    async fn resolve(&self, name: &str, chain: Vec<String>) -> Result<FixtureInstance, FixtureError> {
        // Mark grey under the lock before anything is awaited
        let build = {
            let mut inner = self.inner.lock();
            let Some(entry) = inner.fixtures.get_mut(name) else {
                return Err(logged(FixtureError::NotRegistered(name.to_string())));
            };

            if chain.iter().any(|resolving| resolving == name) {
                entry.state = FixtureState::Failed;
                return Err(logged(FixtureError::CircularDependency(name.to_string())));
            }

            match entry.state {
                FixtureState::Ready => {
                    if let Some(instance) = &entry.instance {
                        return Ok(instance.clone());
                    }
                }
                // Not on this walk and walks are serialized, so it was abandoned
                FixtureState::Initializing => {
                    return Err(logged(FixtureError::Interrupted(name.to_string())));
                }
                FixtureState::CleaningUp => {
                    return Err(logged(FixtureError::CleanupInProgress(name.to_string())));
                }
                FixtureState::Uninitialized | FixtureState::Failed | FixtureState::CleanedUp => {}
            }

            entry.state = FixtureState::Initializing;
            entry.instance = None;
            entry.generation += 1;
            Build {
                generation: entry.generation,
                factory: entry.factory.clone(),
                dependencies: entry.dependencies.clone(),
                cleanup_hooks: entry.cleanup_hooks.clone(),
            }
        };

        let mut chain = chain;
        chain.push(name.to_string());
        RESOLVING.scope(chain, self.build(name, build)).await
    }

    async fn build(&self, name: &str, build: Build) -> Result<FixtureInstance, FixtureError> {
        for dependency in &build.dependencies {
            if let Err(err) = self.get(dependency).await {
                self.fail_build(name, build.generation);
                return Err(logged(FixtureError::DependencyFailed {
                    name: name.to_string(),
                    dependency: dependency.clone(),
                    source: Box::new(err),
                }));
            }
        }

        let outcome = (build.factory)().await;

        let verdict = {
            let mut inner = self.inner.lock();
            let entry = inner.fixtures.get_mut(name);
            match entry {
                None => Err(FixtureError::NotRegistered(name.to_string())),
                Some(entry) if entry.generation != build.generation => {
                    Err(FixtureError::Interrupted(name.to_string()))
                }
                // The factory asked for its own fixture and tripped the guard
                Some(entry) if entry.state == FixtureState::Failed => {
                    Err(FixtureError::CircularDependency(name.to_string()))
                }
                Some(entry) => {
                    match &outcome {
                        Ok(Some(instance)) => {
                            entry.state = FixtureState::Ready;
                            entry.instance = Some(instance.clone());
                        }
                        Ok(None) | Err(_) => entry.state = FixtureState::Failed,
                    }
                    Ok(())
                }
            }
        };

        if let Err(err) = verdict {
            if let Ok(Some(instance)) = &outcome {
                let failed = run_hooks(name, instance, &build.cleanup_hooks).await;
                tracing::debug!(
                    fixture = %name,
                    failed_hooks = failed.len(),
                    "Released instance of a discarded build"
                );
            }
            return Err(logged(err));
        }

        match outcome {
            Ok(Some(instance)) => {
                tracing::debug!(fixture = %name, "Fixture ready");
                Ok(instance)
            }
            Ok(None) => Err(logged(FixtureError::FactoryReturnedEmpty(name.to_string()))),
            Err(err) => Err(logged(FixtureError::FactoryFailed {
                name: name.to_string(),
                reason: err.to_string(),
            })),
        }
    }

    /// Run a fixture's cleanup hooks and release its instance.
    ///
    /// Every declared hook present on the instance runs in order even if an
    /// earlier one fails; the failures are reported together afterwards.
    pub async fn cleanup(&self, name: &str) -> Result<(), FixtureError> {
        let (instance, hooks) = {
            let mut inner = self.inner.lock();
            let Some(entry) = inner.fixtures.get_mut(name) else {
                return Err(logged(FixtureError::NotRegistered(name.to_string())));
            };

            match entry.state {
                FixtureState::Uninitialized | FixtureState::CleanedUp => return Ok(()),
                FixtureState::CleaningUp => {
                    return Err(logged(FixtureError::CleanupInProgress(name.to_string())));
                }
                FixtureState::Initializing | FixtureState::Ready | FixtureState::Failed => {}
            }

            entry.state = FixtureState::CleaningUp;
            entry.generation += 1;
            (entry.instance.clone(), entry.cleanup_hooks.clone())
        };

        let failed_hooks = match &instance {
            Some(instance) => run_hooks(name, instance, &hooks).await,
            None => Vec::new(),
        };
        drop(instance);

        {
            let mut inner = self.inner.lock();
            if let Some(entry) = inner.fixtures.get_mut(name) {
                entry.instance = None;
                entry.state = FixtureState::CleanedUp;
            }
        }

        if failed_hooks.is_empty() {
            tracing::debug!(fixture = %name, "Fixture cleaned up");
            Ok(())
        } else {
            Err(logged(FixtureError::CleanupHookFailure {
                name: name.to_string(),
                hooks: failed_hooks,
            }))
        }
    }

    /// Clean up every fixture in reverse registration order, then discard
    /// all registrations.
    ///
    /// Reverse registration order is not reverse dependency order: a fixture
    /// registered before one of its own dependencies is released after it.
    pub async fn cleanup_all(&self) -> Result<(), FixtureError> {
        let order: Vec<String> = self.inner.lock().order.iter().rev().cloned().collect();

        let mut failed = Vec::new();
        for name in &order {
            if self.cleanup(name).await.is_err() {
                failed.push(name.clone());
            }
        }

        {
            let mut inner = self.inner.lock();
            inner.fixtures.clear();
            inner.order.clear();
        }

        tracing::debug!(
            fixtures = order.len(),
            failed = failed.len(),
            "Fixture registry cleared"
        );

        if failed.is_empty() {
            Ok(())
        } else {
            Err(FixtureError::TeardownIncomplete { failed })
        }
    }

    /// Force a fixture back to `Uninitialized` so the next `get` rebuilds it.
    /// A ready fixture is cleaned up first and the cleanup outcome returned.
    pub async fn reset(&self, name: &str) -> Result<(), FixtureError> {
        let Some(state) = self.state(name) else {
            return Err(logged(FixtureError::NotRegistered(name.to_string())));
        };

        let outcome = if state == FixtureState::Ready {
            self.cleanup(name).await
        } else {
            Ok(())
        };

        self.force_state(name, FixtureState::Uninitialized);
        outcome
    }

    /// Clean up a fixture and drop its registration
    pub async fn unregister(&self, name: &str) -> Result<(), FixtureError> {
        let outcome = self.cleanup(name).await;
        if matches!(outcome, Err(FixtureError::NotRegistered(_))) {
            return outcome;
        }

        let mut inner = self.inner.lock();
        inner.fixtures.remove(name);
        inner.order.retain(|registered| registered != name);
        outcome
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.lock().fixtures.contains_key(name)
    }

    pub fn state(&self, name: &str) -> Option<FixtureState> {
        self.inner.lock().fixtures.get(name).map(|entry| entry.state)
    }

    pub fn dependencies(&self, name: &str) -> Option<Vec<String>> {
        self.inner
            .lock()
            .fixtures
            .get(name)
            .map(|entry| entry.dependencies.clone())
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<String> {
        self.inner.lock().order.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark a build failed unless something already interrupted it
    fn fail_build(&self, name: &str, generation: u64) {
        if let Some(entry) = self.inner.lock().fixtures.get_mut(name) {
            if entry.generation == generation {
                entry.state = FixtureState::Failed;
            }
        }
    }

    fn force_state(&self, name: &str, state: FixtureState) {
        if let Some(entry) = self.inner.lock().fixtures.get_mut(name) {
            entry.state = state;
            entry.instance = None;
            entry.generation += 1;
        }
    }
}

/// Run the named hooks present on `instance`, returning the ones that failed
async fn run_hooks(name: &str, instance: &FixtureInstance, hooks: &[String]) -> Vec<String> {
    let mut failed = Vec::new();
    for hook_name in hooks {
        let Some(hook) = instance.hook(hook_name) else {
            tracing::debug!(fixture = %name, hook = %hook_name, "Cleanup hook not present, skipping");
            continue;
        };
        if !hook(instance.value().clone()).await {
            tracing::debug!(fixture = %name, hook = %hook_name, "Cleanup hook failed");
            failed.push(hook_name.clone());
        }
    }
    failed
}

/// Log a failure at the severity its kind calls for and hand it back
fn logged(err: FixtureError) -> FixtureError {
    let fixture = err.fixture_name().unwrap_or_default();
    if err.is_warning() {
        tracing::warn!(fixture = %fixture, error = %err, "Fixture operation failed");
    } else {
        tracing::error!(fixture = %fixture, error = %err, "Fixture operation failed");
    }
    err
}
