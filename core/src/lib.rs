//! GDSentry core
//!
//! Fixture and mock machinery for the GDSentry test framework. Fixtures are
//! named, lazily built resources with declared dependencies and cleanup
//! hooks; mocks are dynamic call recorders with stubbed responses and
//! verification queries. Engine access goes through the `SceneHost` port.

pub mod app;
pub mod domain;
pub mod error;

#[cfg(test)]
mod test_utils;

pub use app::{
    default_return_for, FixtureRegistry, MockEngine, MockHandle, StubBuilder, TestContext,
    Verifier, SCENE_FREE_HOOK,
};
pub use domain::entities::{
    FactoryResult, FixtureDefinition, FixtureInstance, FixtureState, StubKey, StubResponse,
};
pub use domain::ports::{SceneHost, SceneNode};
pub use error::{BoxError, FixtureError, SceneHostError, VerificationError};
