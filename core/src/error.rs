//! Error types for the GDSentry core
//!
//! This module defines error types for each component:
//! - `FixtureError`: fixture registration, resolution and teardown errors
//! - `VerificationError`: failed expectations against a mock's call log
//! - `SceneHostError`: failures reported by a `SceneHost` implementation
//!
//! None of these abort the host process. The registry logs and returns them;
//! the `TestContext` facade turns them into `None`/`false` for test authors.

use thiserror::Error;

/// Boxed error returned by user-supplied fixture factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fixture lifecycle errors
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Fixture not registered: {0}")]
    NotRegistered(String),

    #[error("Circular dependency detected while initializing fixture: {0}")]
    CircularDependency(String),

    #[error("Fixture '{name}' failed because dependency '{dependency}' failed: {source}")]
    DependencyFailed {
        name: String,
        dependency: String,
        #[source]
        source: Box<FixtureError>,
    },

    #[error("Fixture factory returned no instance: {0}")]
    FactoryReturnedEmpty(String),

    #[error("Fixture factory failed for '{name}': {reason}")]
    FactoryFailed { name: String, reason: String },

    #[error("Initialization of fixture '{0}' was interrupted by cleanup or reset")]
    Interrupted(String),

    #[error("Cleanup already in progress for fixture: {0}")]
    CleanupInProgress(String),

    #[error("Cleanup hooks failed for fixture '{name}': {}", .hooks.join(", "))]
    CleanupHookFailure { name: String, hooks: Vec<String> },

    #[error("Teardown incomplete, fixtures failed to clean up: {}", .failed.join(", "))]
    TeardownIncomplete { failed: Vec<String> },
}

impl FixtureError {
    /// Name of the fixture the error is about
    pub fn fixture_name(&self) -> Option<&str> {
        match self {
            FixtureError::NotRegistered(name)
            | FixtureError::CircularDependency(name)
            | FixtureError::FactoryReturnedEmpty(name)
            | FixtureError::Interrupted(name)
            | FixtureError::CleanupInProgress(name) => Some(name.as_str()),
            FixtureError::DependencyFailed { name, .. }
            | FixtureError::FactoryFailed { name, .. }
            | FixtureError::CleanupHookFailure { name, .. } => Some(name.as_str()),
            FixtureError::TeardownIncomplete { .. } => None,
        }
    }

    /// The innermost error of a dependency chain
    pub fn root_cause(&self) -> &FixtureError {
        match self {
            FixtureError::DependencyFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Recoverable misuse is reported as a warning, everything else as an error
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            FixtureError::Interrupted(_)
                | FixtureError::CleanupInProgress(_)
                | FixtureError::CleanupHookFailure { .. }
        )
    }
}

/// A mock expectation that did not hold
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("expected '{method}' on mock '{mock}' to be called, but it was never called")]
    NeverCalled { mock: String, method: String },

    #[error(
        "expected '{method}' on mock '{mock}' to never be called, but it was called {actual} times"
    )]
    UnexpectedCall {
        mock: String,
        method: String,
        actual: usize,
    },

    #[error(
        "expected '{method}' on mock '{mock}' to be called {expected} times, but it was called {actual} times"
    )]
    CallCount {
        mock: String,
        method: String,
        expected: String,
        actual: usize,
    },

    #[error("expected '{method}' on mock '{mock}' to be called with {expected}, but it was called with {actual}")]
    ArgumentMismatch {
        mock: String,
        method: String,
        expected: String,
        actual: String,
    },
}

/// Errors reported by a scene host implementation
#[derive(Debug, Error)]
pub enum SceneHostError {
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    #[error("Failed to instantiate scene {path}: {reason}")]
    Instantiate { path: String, reason: String },

    #[error("Failed to attach node {0} to the scene tree")]
    Attach(String),
}
