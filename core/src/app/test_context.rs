//! Test context
//!
//! The surface a test-lifecycle harness calls into around each suite. It owns
//! one fixture registry and one mock engine, and converts registry errors
//! into `None`/`false` results: the registry has already logged them, and a
//! test is expected to check for absence before using a fixture.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::app::fixture_registry::FixtureRegistry;
use crate::app::mock_engine::{MockEngine, MockHandle};
use crate::app::stub_builder::StubBuilder;
use crate::app::verifier::Verifier;
use crate::domain::entities::{FactoryResult, FixtureDefinition, FixtureInstance, FixtureState};
use crate::domain::ports::{SceneHost, SceneNode};

/// Cleanup hook name registered for scene fixtures
pub const SCENE_FREE_HOOK: &str = "queue_free";

pub struct TestContext {
    suite: String,
    fixtures: Arc<FixtureRegistry>,
    mocks: MockEngine,
}

impl TestContext {
    pub fn new(suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            fixtures: Arc::new(FixtureRegistry::new()),
            mocks: MockEngine::new(),
        }
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// The underlying registry, for factories that need to look up other
    /// fixtures themselves
    pub fn fixtures(&self) -> &Arc<FixtureRegistry> {
        &self.fixtures
    }

    pub fn mocks(&self) -> &MockEngine {
        &self.mocks
    }

    // ==========================================================================
    // Fixtures
    // ==========================================================================

    pub fn register_fixture(&self, definition: FixtureDefinition) {
        self.fixtures.register(definition);
    }

    pub async fn get_fixture(&self, name: &str) -> Option<FixtureInstance> {
        self.fixtures.get(name).await.ok()
    }

    /// Get a fixture and downcast it to its concrete type
    pub async fn get_fixture_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let instance = self.get_fixture(name).await?;
        let typed = instance.downcast::<T>();
        if typed.is_none() {
            tracing::error!(
                suite = %self.suite,
                fixture = %name,
                expected = std::any::type_name::<T>(),
                "Fixture has a different type than requested"
            );
        }
        typed
    }

    pub fn fixture_state(&self, name: &str) -> Option<FixtureState> {
        self.fixtures.state(name)
    }

    pub async fn reset_fixture(&self, name: &str) -> bool {
        self.fixtures.reset(name).await.is_ok()
    }

    pub async fn cleanup_all_fixtures(&self) -> bool {
        match self.fixtures.cleanup_all().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(suite = %self.suite, error = %err, "Fixture teardown incomplete");
                false
            }
        }
    }

    /// Register a fixture that instantiates `scene_path` through `host`,
    /// attaches it to the scene tree and waits one frame before handing it
    /// out. Cleanup frees the node through the same host.
    pub fn register_scene_fixture(
        &self,
        name: &str,
        host: Arc<dyn SceneHost>,
        scene_path: &str,
        dependencies: &[&str],
    ) {
        let scene_path = scene_path.to_string();
        let definition = FixtureDefinition::new(name, move || {
            build_scene_fixture(host.clone(), scene_path.clone())
        })
        .depends_on(dependencies.iter().copied())
        .with_cleanup_hooks([SCENE_FREE_HOOK]);

        self.fixtures.register(definition);
    }

    // ==========================================================================
    // Mocks
    // ==========================================================================

    pub fn create_mock(&self, name: &str) -> MockHandle {
        self.mocks.create(name)
    }

    pub fn call(&self, mock: &MockHandle, method: &str, args: &[Value]) -> Value {
        self.mocks.call(mock, method, args)
    }

    pub fn when(&self, mock: &MockHandle, method: &str) -> StubBuilder {
        self.mocks.stub(mock, method)
    }

    pub fn verify(&self, mock: &MockHandle, method: &str) -> Verifier {
        self.mocks.verify(mock, method)
    }

    pub fn cleanup_mocks(&self) -> usize {
        self.mocks.reset_all()
    }

    // ==========================================================================
    // Lifecycle
    // ==========================================================================

    /// Suite teardown: clear mocks, then release every fixture
    pub async fn teardown(&self) -> bool {
        let mocks = self.cleanup_mocks();
        let clean = self.cleanup_all_fixtures().await;
        tracing::info!(suite = %self.suite, mocks, clean, "Suite torn down");
        clean
    }
}

async fn build_scene_fixture(host: Arc<dyn SceneHost>, scene_path: String) -> FactoryResult {
    let node = host.instantiate(&scene_path).await?;
    host.add_child(&node).await?;
    host.await_frame().await;

    let instance = FixtureInstance::new(node).with_hook(SCENE_FREE_HOOK, move |node: Arc<SceneNode>| {
        let host = host.clone();
        async move { host.queue_free(&node).await }
    });
    Ok(Some(instance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::test_utils::{
        event_log, events, failing_fixture, recording_fixture, value_fixture, RecordingSceneHost,
    };

    #[derive(Debug, PartialEq)]
    struct Settings {
        volume: u8,
    }

    #[tokio::test]
    async fn get_fixture_returns_none_on_failure() {
        let ctx = TestContext::new("suite");
        ctx.register_fixture(failing_fixture("db"));

        assert!(ctx.get_fixture("db").await.is_none());
        assert!(ctx.get_fixture("missing").await.is_none());
        assert_eq!(ctx.fixture_state("db"), Some(FixtureState::Failed));
    }

    #[tokio::test]
    async fn get_fixture_as_downcasts() {
        let ctx = TestContext::new("suite");
        ctx.register_fixture(value_fixture("settings", 7u8));
        ctx.register_fixture(FixtureDefinition::from_fn("typed", || {
            Ok(Some(FixtureInstance::new(Settings { volume: 3 })))
        }));

        assert_eq!(ctx.get_fixture_as::<u8>("settings").await.as_deref(), Some(&7));
        assert_eq!(
            ctx.get_fixture_as::<Settings>("typed").await.as_deref(),
            Some(&Settings { volume: 3 })
        );
        assert!(ctx.get_fixture_as::<String>("settings").await.is_none());
    }

    #[tokio::test]
    async fn reset_fixture_reports_outcome() {
        let ctx = TestContext::new("suite");
        let log = event_log();
        ctx.register_fixture(recording_fixture("db", &log));
        ctx.get_fixture("db").await.unwrap();

        assert!(ctx.reset_fixture("db").await);
        assert!(!ctx.reset_fixture("missing").await);
        assert_eq!(ctx.fixture_state("db"), Some(FixtureState::Uninitialized));
    }

    #[tokio::test]
    async fn teardown_clears_mocks_and_fixtures() {
        let ctx = TestContext::new("suite");
        let log = event_log();
        ctx.register_fixture(recording_fixture("db", &log));
        ctx.get_fixture("db").await.unwrap();
        let mock = ctx.create_mock("Audio");
        ctx.call(&mock, "play", &[json!("boom")]);

        assert!(ctx.teardown().await);

        assert!(ctx.mocks().is_empty());
        assert!(ctx.fixtures().is_empty());
        assert!(ctx.verify(&mock, "play").was_never_called());
        assert_eq!(events(&log), vec!["init:db", "close:db"]);
    }

    #[tokio::test]
    async fn mock_surface_round_trip() {
        let ctx = TestContext::new("suite");
        let calc = ctx.create_mock("Calculator");
        ctx.when(&calc, "add")
            .with_args(&[json!(2), json!(3)])
            .then_return(5);

        assert_eq!(ctx.call(&calc, "add", &[json!(2), json!(3)]), json!(5));
        assert!(ctx.verify(&calc, "add").was_called_with(&[json!(2), json!(3)]));
        assert_eq!(ctx.cleanup_mocks(), 1);
    }

    // ==========================================================================
    // Scene fixture tests
    // ==========================================================================

    #[tokio::test]
    async fn scene_fixture_instantiates_and_frees() {
        let host = Arc::new(RecordingSceneHost::new());
        let ctx = TestContext::new("scenes");
        ctx.register_scene_fixture("player", host.clone(), "res://actors/Player.tscn", &[]);

        let node = ctx
            .get_fixture_as::<SceneNode>("player")
            .await
            .expect("scene should instantiate");

        assert_eq!(node.name, "Player");
        assert_eq!(node.scene_path, "res://actors/Player.tscn");
        assert_eq!(host.frame_count(), 1);
        assert_eq!(*host.attached.read().unwrap(), vec![node.id]);

        assert!(ctx.cleanup_all_fixtures().await);
        assert_eq!(host.freed_nodes(), vec![node.id]);
    }

    #[tokio::test]
    async fn scene_fixture_waits_for_dependencies() {
        let host = Arc::new(RecordingSceneHost::new());
        let log = event_log();
        let ctx = TestContext::new("scenes");
        ctx.register_fixture(recording_fixture("world", &log));
        ctx.register_scene_fixture("enemy", host.clone(), "res://Enemy.tscn", &["world"]);

        assert!(ctx.get_fixture("enemy").await.is_some());
        assert_eq!(events(&log), vec!["init:world"]);
        assert_eq!(ctx.fixture_state("world"), Some(FixtureState::Ready));
    }

    #[tokio::test]
    async fn missing_scene_fails_fixture() {
        let host = Arc::new(RecordingSceneHost::new().with_missing_scene("res://Gone.tscn"));
        let ctx = TestContext::new("scenes");
        ctx.register_scene_fixture("gone", host.clone(), "res://Gone.tscn", &[]);

        assert!(ctx.get_fixture("gone").await.is_none());
        assert_eq!(ctx.fixture_state("gone"), Some(FixtureState::Failed));
        assert_eq!(host.frame_count(), 0);
    }
}
