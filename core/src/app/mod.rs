//! Application layer
//!
//! Fixture lifecycle, mock bookkeeping and the per-suite context that ties
//! them together.

pub mod fixture_registry;
pub mod mock_engine;
pub mod stub_builder;
pub mod test_context;
pub mod verifier;

pub use fixture_registry::FixtureRegistry;
pub use mock_engine::{default_return_for, MockEngine, MockHandle};
pub use stub_builder::StubBuilder;
pub use test_context::{TestContext, SCENE_FREE_HOOK};
pub use verifier::Verifier;
