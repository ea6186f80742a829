//! Suite runner
//!
//! Runs every test case of a manifest against its own `TestContext`. A case
//! fails on a missing fixture, a mismatched call result, a failed
//! verification or an unclean teardown, and is cut off at the configured
//! timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gdsentry_core::{FactoryResult, FixtureDefinition, FixtureInstance, MockHandle, TestContext};
use serde_json::Value;

use crate::manifest::{FixtureSpec, MockSpec, SuiteManifest, TestCaseSpec, VerifySpec};
use crate::report::{SuiteReport, TestResult, TestStatus};

pub struct SuiteRunner {
    manifest: SuiteManifest,
    timeout: Duration,
}

impl SuiteRunner {
    pub fn new(manifest: SuiteManifest, timeout: Duration) -> Self {
        Self { manifest, timeout }
    }

    pub async fn run(&self) -> SuiteReport {
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(self.manifest.tests.len());
        for case in &self.manifest.tests {
            results.push(self.run_case(case).await);
        }

        let report = SuiteReport::new(&self.manifest.suite, started_at, results);
        tracing::info!(
            suite = %report.suite,
            passed = report.passed,
            failed = report.failed,
            "Suite finished"
        );
        report
    }

    async fn run_case(&self, case: &TestCaseSpec) -> TestResult {
        let ctx = TestContext::new(&self.manifest.suite);
        for fixture in &self.manifest.fixtures {
            ctx.register_fixture(fixture_definition(fixture));
        }

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, execute(&ctx, case)).await;
        let (status, mut failures) = match outcome {
            Ok(failures) if failures.is_empty() => (TestStatus::Passed, failures),
            Ok(failures) => (TestStatus::Failed, failures),
            Err(_) => (
                TestStatus::TimedOut,
                vec![format!("timed out after {} ms", self.timeout.as_millis())],
            ),
        };

        let status = if ctx.teardown().await {
            status
        } else {
            failures.push("teardown did not complete cleanly".to_string());
            match status {
                TestStatus::Passed => TestStatus::Failed,
                other => other,
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        if status == TestStatus::Passed {
            tracing::debug!(test = %case.name, duration_ms, "Test passed");
        } else {
            tracing::warn!(test = %case.name, ?status, failures = failures.len(), "Test failed");
        }

        TestResult {
            name: case.name.clone(),
            status,
            failures,
            duration_ms,
        }
    }
}

/// Run one case and collect every failure rather than stopping at the first
async fn execute(ctx: &TestContext, case: &TestCaseSpec) -> Vec<String> {
    let mut failures = Vec::new();

    for name in &case.fixtures {
        if ctx.get_fixture(name).await.is_none() {
            failures.push(format!("fixture '{}' unavailable", name));
        }
    }
    for name in &case.missing_fixtures {
        if ctx.get_fixture(name).await.is_some() {
            failures.push(format!("fixture '{}' resolved but was expected to fail", name));
        }
    }

    for mock in &case.mocks {
        run_mock(ctx, mock, &mut failures);
    }

    failures
}

fn run_mock(ctx: &TestContext, spec: &MockSpec, failures: &mut Vec<String>) {
    let mock = ctx.create_mock(&spec.name);

    for stub in &spec.stubs {
        let builder = ctx.when(&mock, &stub.method);
        let builder = match &stub.args {
            Some(args) => builder.with_args(args),
            None => builder,
        };
        builder.then_return(stub.returns.clone());
    }

    for call in &spec.calls {
        let actual = ctx.call(&mock, &call.method, &call.args);
        if let Some(expected) = &call.expect {
            if &actual != expected {
                failures.push(format!(
                    "{}.{}{} returned {}, expected {}",
                    spec.name,
                    call.method,
                    Value::Array(call.args.clone()),
                    actual,
                    expected
                ));
            }
        }
    }

    for check in &spec.verify {
        failures.extend(verify(ctx, &mock, check));
    }
}

fn verify(ctx: &TestContext, mock: &MockHandle, check: &VerifySpec) -> Vec<String> {
    let verifier = ctx.verify(mock, &check.method);
    let mut outcomes = Vec::new();

    if check.never {
        outcomes.push(verifier.expect_never_called());
    }
    if let Some(times) = check.times {
        outcomes.push(verifier.expect_called_times(times));
    }
    if let Some(times) = check.at_least {
        outcomes.push(verifier.expect_called_at_least(times));
    }
    if let Some(times) = check.at_most {
        outcomes.push(verifier.expect_called_at_most(times));
    }
    if let Some(args) = &check.called_with {
        outcomes.push(verifier.expect_called_with(args));
    }

    outcomes
        .into_iter()
        .filter_map(|outcome| outcome.err().map(|err| err.to_string()))
        .collect()
}

fn fixture_definition(spec: &FixtureSpec) -> FixtureDefinition {
    let factory_spec = spec.clone();
    FixtureDefinition::new(spec.name.clone(), move || build_fixture(factory_spec.clone()))
        .depends_on(spec.depends_on.iter().cloned())
        .with_cleanup_hooks(spec.cleanup_hooks.iter().cloned())
}

async fn build_fixture(spec: FixtureSpec) -> FactoryResult {
    if let Some(ms) = spec.delay_ms {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
    if let Some(reason) = spec.error {
        return Err(reason.into());
    }
    if spec.empty {
        return Ok(None);
    }

    let mut instance = FixtureInstance::new(spec.value);
    for hook in spec.cleanup_hooks {
        let succeeds = !spec.failing_hooks.contains(&hook);
        instance = instance.with_hook(hook, move |_value: Arc<Value>| async move { succeeds });
    }
    Ok(Some(instance))
}
