//! Fixture domain entity
//!
//! A fixture is a named, lazily-constructed test resource with declared
//! dependencies and cleanup hooks. This module holds the value types; the
//! lifecycle itself is driven by `FixtureRegistry`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::BoxError;

/// Lifecycle state of a registered fixture
///
/// During resolution `Uninitialized` is unvisited, `Initializing` is being
/// built and `Ready` is finished. Cycles are detected from the walk itself,
/// not from this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
    CleaningUp,
    CleanedUp,
}

impl fmt::Display for FixtureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureState::Uninitialized => write!(f, "uninitialized"),
            FixtureState::Initializing => write!(f, "initializing"),
            FixtureState::Ready => write!(f, "ready"),
            FixtureState::Failed => write!(f, "failed"),
            FixtureState::CleaningUp => write!(f, "cleaning_up"),
            FixtureState::CleanedUp => write!(f, "cleaned_up"),
        }
    }
}

/// Shared, type-erased fixture value
pub type InstanceRef = Arc<dyn Any + Send + Sync>;

/// A named teardown method on a fixture instance. Resolves to `false` when
/// the hook could not release its resource.
pub type CleanupHook = Arc<dyn Fn(InstanceRef) -> BoxFuture<'static, bool> + Send + Sync>;

/// What a factory produces: an instance, nothing at all, or an error
pub type FactoryResult = Result<Option<FixtureInstance>, BoxError>;

/// Zero-argument asynchronous fixture constructor
pub type FixtureFactory = Arc<dyn Fn() -> BoxFuture<'static, FactoryResult> + Send + Sync>;

/// A constructed fixture value together with its method table
///
/// Cloning is cheap and preserves identity: every clone points at the same
/// underlying value, so `ptr_eq` tells whether two lookups returned the
/// same instance.
#[derive(Clone)]
pub struct FixtureInstance {
    value: InstanceRef,
    hooks: HashMap<String, CleanupHook>,
}

impl FixtureInstance {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc(value: InstanceRef) -> Self {
        Self {
            value,
            hooks: HashMap::new(),
        }
    }

    /// Add a named teardown method. The hook receives the instance value
    /// downcast to `T`; if the value is not a `T` the hook reports failure.
    pub fn with_hook<T, F, Fut>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let hook: CleanupHook = Arc::new(move |value: InstanceRef| match value.downcast::<T>() {
            Ok(typed) => hook(typed).boxed(),
            Err(_) => future::ready(false).boxed(),
        });
        self.hooks.insert(name.into(), hook);
        self
    }

    pub fn value(&self) -> &InstanceRef {
        &self.value
    }

    /// Typed view of the value, `None` if it is not a `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    pub fn has_hook(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    pub fn hook(&self, name: &str) -> Option<CleanupHook> {
        self.hooks.get(name).cloned()
    }

    pub fn hook_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether both handles refer to the same underlying value
    pub fn ptr_eq(&self, other: &FixtureInstance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for FixtureInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureInstance")
            .field("hooks", &self.hook_names())
            .finish_non_exhaustive()
    }
}

/// Everything needed to register a fixture
#[derive(Clone)]
pub struct FixtureDefinition {
    pub name: String,
    pub factory: FixtureFactory,
    pub dependencies: Vec<String>,
    pub cleanup_hooks: Vec<String>,
}

impl FixtureDefinition {
    pub fn new<F, Fut>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FactoryResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(move || factory().boxed()),
            dependencies: Vec::new(),
            cleanup_hooks: Vec::new(),
        }
    }

    /// Register a synchronous factory
    pub fn from_fn<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> FactoryResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(move || future::ready(factory()).boxed()),
            dependencies: Vec::new(),
            cleanup_hooks: Vec::new(),
        }
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cleanup_hooks<I, S>(mut self, hooks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cleanup_hooks = hooks.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for FixtureDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureDefinition")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("cleanup_hooks", &self.cleanup_hooks)
            .finish_non_exhaustive()
    }
}
