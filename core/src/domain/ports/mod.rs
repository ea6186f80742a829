//! Domain ports (traits)
//!
//! Port traits define the engine capabilities the core requires.
//! The engine-side harness provides concrete implementations.

pub mod scene_host;

pub use scene_host::{SceneHost, SceneNode};
