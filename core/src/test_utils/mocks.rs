//! Mock implementations of port traits
//!
//! In-memory scene host that records every engine call so tests can verify
//! what a scene fixture did.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::domain::ports::{SceneHost, SceneNode};
use crate::error::SceneHostError;

/// A scene host that tracks calls and fails for configured scene paths
#[derive(Default)]
pub struct RecordingSceneHost {
    pub instantiated: Arc<RwLock<Vec<String>>>,
    pub attached: Arc<RwLock<Vec<u64>>>,
    pub freed: Arc<RwLock<Vec<u64>>>,
    pub frames: Arc<RwLock<u64>>,
    missing_scenes: Arc<RwLock<HashSet<String>>>,
    next_id: Arc<RwLock<u64>>,
}

impl RecordingSceneHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure a scene path that cannot be instantiated
    pub fn with_missing_scene(self, scene_path: &str) -> Self {
        {
            let mut missing = self.missing_scenes.write().unwrap();
            missing.insert(scene_path.to_string());
        }
        self
    }

    pub fn frame_count(&self) -> u64 {
        *self.frames.read().unwrap()
    }

    pub fn freed_nodes(&self) -> Vec<u64> {
        self.freed.read().unwrap().clone()
    }
}

#[async_trait]
impl SceneHost for RecordingSceneHost {
    async fn instantiate(&self, scene_path: &str) -> Result<SceneNode, SceneHostError> {
        if self.missing_scenes.read().unwrap().contains(scene_path) {
            return Err(SceneHostError::SceneNotFound(scene_path.to_string()));
        }

        let id = {
            let mut n = self.next_id.write().unwrap();
            *n += 1;
            *n
        };
        self.instantiated
            .write()
            .unwrap()
            .push(scene_path.to_string());

        let name = scene_path
            .rsplit('/')
            .next()
            .and_then(|file| file.split('.').next())
            .unwrap_or("Node")
            .to_string();

        Ok(SceneNode {
            id,
            name,
            scene_path: scene_path.to_string(),
        })
    }

    async fn add_child(&self, node: &SceneNode) -> Result<(), SceneHostError> {
        self.attached.write().unwrap().push(node.id);
        Ok(())
    }

    async fn await_frame(&self) {
        tokio::task::yield_now().await;
        *self.frames.write().unwrap() += 1;
    }

    async fn queue_free(&self, node: &SceneNode) -> bool {
        let attached = self.attached.read().unwrap();
        let mut freed = self.freed.write().unwrap();
        if !attached.contains(&node.id) || freed.contains(&node.id) {
            return false;
        }
        freed.push(node.id);
        true
    }
}
