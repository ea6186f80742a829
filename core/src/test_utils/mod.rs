//! Test utilities
//!
//! Fixture definitions and hand-written port mocks for unit testing.
//!
//! Why manual mocks?
//! - The scene host trait is async and takes `&str`/`&SceneNode` parameters
//! - Manual mocks are more explicit and easier to debug
//! - We control exactly what they record without macro magic

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
