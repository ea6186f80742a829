//! Scene host port trait
//!
//! Defines the engine capabilities a scene fixture needs. The real
//! implementation lives in the engine-side harness; this crate only depends
//! on the trait.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::SceneHostError;

/// A node instantiated from a scene resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneNode {
    pub id: u64,
    pub name: String,
    pub scene_path: String,
}

/// Engine operations used to build and free scene fixtures
#[async_trait]
pub trait SceneHost: Send + Sync {
    /// Instantiate a scene resource into a detached node
    async fn instantiate(&self, scene_path: &str) -> Result<SceneNode, SceneHostError>;

    /// Attach a node to the running scene tree
    async fn add_child(&self, node: &SceneNode) -> Result<(), SceneHostError>;

    /// Suspend until the engine has processed one frame
    async fn await_frame(&self);

    /// Schedule a node for deletion, `false` if the node was unknown
    async fn queue_free(&self, node: &SceneNode) -> bool;
}
