//! Suite manifest
//!
//! Declarative description of one suite: the fixtures it registers and the
//! test cases that fetch fixtures and drive mocks.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct SuiteManifest {
    pub suite: String,
    #[serde(default)]
    pub fixtures: Vec<FixtureSpec>,
    #[serde(default)]
    pub tests: Vec<TestCaseSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSpec {
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Value handed out by the fixture
    #[serde(default)]
    pub value: Value,
    /// Factory produces nothing
    #[serde(default)]
    pub empty: bool,
    /// Factory fails with this reason
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub cleanup_hooks: Vec<String>,
    /// Subset of `cleanup_hooks` that report failure
    #[serde(default)]
    pub failing_hooks: Vec<String>,
    /// Simulated setup time
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestCaseSpec {
    pub name: String,
    /// Fixtures that must resolve
    #[serde(default)]
    pub fixtures: Vec<String>,
    /// Fixtures that must fail to resolve
    #[serde(default)]
    pub missing_fixtures: Vec<String>,
    #[serde(default)]
    pub mocks: Vec<MockSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockSpec {
    pub name: String,
    #[serde(default)]
    pub stubs: Vec<StubSpec>,
    #[serde(default)]
    pub calls: Vec<CallSpec>,
    #[serde(default)]
    pub verify: Vec<VerifySpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StubSpec {
    pub method: String,
    /// Exact argument list; omitted means any arguments
    #[serde(default)]
    pub args: Option<Vec<Value>>,
    #[serde(default)]
    pub returns: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallSpec {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
    /// Expected return value. An explicit `null` is checked; an absent key
    /// is not.
    #[serde(default, deserialize_with = "present")]
    pub expect: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifySpec {
    pub method: String,
    #[serde(default)]
    pub times: Option<usize>,
    #[serde(default)]
    pub at_least: Option<usize>,
    #[serde(default)]
    pub at_most: Option<usize>,
    #[serde(default)]
    pub called_with: Option<Vec<Value>>,
    #[serde(default)]
    pub never: bool,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl SuiteManifest {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid manifest {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let manifest: SuiteManifest = serde_json::from_str(raw)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        for fixture in &self.fixtures {
            if let Some(hook) = fixture
                .failing_hooks
                .iter()
                .find(|hook| !fixture.cleanup_hooks.contains(hook))
            {
                anyhow::bail!(
                    "fixture '{}' marks hook '{}' as failing but does not declare it",
                    fixture.name,
                    hook
                );
            }
        }
        Ok(())
    }
}
