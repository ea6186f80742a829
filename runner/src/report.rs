use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    pub failures: Vec<String>,
    pub duration_ms: u64,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<TestResult>,
}

impl SuiteReport {
    pub fn new(suite: &str, started_at: DateTime<Utc>, results: Vec<TestResult>) -> Self {
        let passed = results.iter().filter(|result| result.passed()).count();
        Self {
            suite: suite.to_string(),
            started_at,
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "suite {}", self.suite);
        for result in &self.results {
            let label = match result.status {
                TestStatus::Passed => "PASS",
                TestStatus::Failed => "FAIL",
                TestStatus::TimedOut => "TIME",
            };
            let _ = writeln!(
                out,
                "  {}  {} ({} ms)",
                label, result.name, result.duration_ms
            );
            for failure in &result.failures {
                let _ = writeln!(out, "        - {}", failure);
            }
        }
        let _ = writeln!(out, "{} passed, {} failed", self.passed, self.failed);
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, status: TestStatus, failures: &[&str]) -> TestResult {
        TestResult {
            name: name.to_string(),
            status,
            failures: failures.iter().map(|f| f.to_string()).collect(),
            duration_ms: 2,
        }
    }

    fn sample_report() -> SuiteReport {
        SuiteReport::new(
            "combat",
            Utc::now(),
            vec![
                result("spawns", TestStatus::Passed, &[]),
                result("attacks", TestStatus::Failed, &["fixture 'db' unavailable"]),
                result("waits", TestStatus::TimedOut, &["timed out after 10 ms"]),
            ],
        )
    }

    #[test]
    fn counts_outcomes() {
        let report = sample_report();
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 2);
        assert!(!report.success());

        let empty = SuiteReport::new("empty", Utc::now(), Vec::new());
        assert!(empty.success());
    }

    #[test]
    fn text_lists_failures_under_their_test() {
        let text = sample_report().render_text();
        assert_eq!(
            text,
            "suite combat\n\
             \x20 PASS  spawns (2 ms)\n\
             \x20 FAIL  attacks (2 ms)\n\
             \x20       - fixture 'db' unavailable\n\
             \x20 TIME  waits (2 ms)\n\
             \x20       - timed out after 10 ms\n\
             1 passed, 2 failed\n"
        );
    }

    #[test]
    fn json_uses_snake_case_status() {
        let json: serde_json::Value =
            serde_json::from_str(&sample_report().to_json().unwrap()).unwrap();
        assert_eq!(json["results"][2]["status"], "timed_out");
        assert_eq!(json["failed"], 2);
    }
}
