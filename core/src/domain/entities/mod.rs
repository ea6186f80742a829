//! Domain entities
//!
//! Plain value types for fixtures and mocks. Lifecycle logic lives in `app`.

pub mod fixture;
pub mod mock;

pub use fixture::{
    CleanupHook, FactoryResult, FixtureDefinition, FixtureFactory, FixtureInstance, FixtureState,
    InstanceRef,
};
pub use mock::{
    args_signature, CallRecord, MockId, StubCallable, StubKey, StubResponse, DEFAULT_MOCK_NAME,
};
