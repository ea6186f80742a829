//! Call verification
//!
//! Read-only queries over one method's entries in a mock's call log. The
//! boolean queries suit `assert!`; the `expect_*` variants return a
//! `VerificationError` describing expected versus actual for test reports.

use serde_json::Value;

use crate::app::mock_engine::MockHandle;
use crate::domain::entities::{args_signature, CallRecord};
use crate::error::VerificationError;

pub struct Verifier {
    mock: MockHandle,
    method: String,
}

impl Verifier {
    pub(crate) fn new(mock: MockHandle, method: &str) -> Self {
        Self {
            mock,
            method: method.to_string(),
        }
    }

    fn calls(&self) -> Vec<CallRecord> {
        self.mock.calls_to(&self.method)
    }

    pub fn get_call_count(&self) -> usize {
        self.calls().len()
    }

    pub fn was_called(&self) -> bool {
        self.get_call_count() > 0
    }

    pub fn was_called_times(&self, times: usize) -> bool {
        self.get_call_count() == times
    }

    pub fn was_called_at_least(&self, times: usize) -> bool {
        self.get_call_count() >= times
    }

    pub fn was_called_at_most(&self, times: usize) -> bool {
        self.get_call_count() <= times
    }

    pub fn was_never_called(&self) -> bool {
        self.get_call_count() == 0
    }

    /// Whether any recorded call had exactly these arguments
    pub fn was_called_with(&self, args: &[Value]) -> bool {
        self.calls().iter().any(|record| record.args == args)
    }

    /// Argument lists of every call, oldest first
    pub fn get_call_args(&self) -> Vec<Vec<Value>> {
        self.calls().into_iter().map(|record| record.args).collect()
    }

    pub fn get_last_call_args(&self) -> Option<Vec<Value>> {
        self.calls().pop().map(|record| record.args)
    }

    pub fn expect_called(&self) -> Result<(), VerificationError> {
        if self.was_called() {
            Ok(())
        } else {
            Err(VerificationError::NeverCalled {
                mock: self.mock.name().to_string(),
                method: self.method.clone(),
            })
        }
    }

    pub fn expect_never_called(&self) -> Result<(), VerificationError> {
        match self.get_call_count() {
            0 => Ok(()),
            actual => Err(VerificationError::UnexpectedCall {
                mock: self.mock.name().to_string(),
                method: self.method.clone(),
                actual,
            }),
        }
    }

    pub fn expect_called_times(&self, times: usize) -> Result<(), VerificationError> {
        self.check_count(times.to_string(), |actual| actual == times)
    }

    pub fn expect_called_at_least(&self, times: usize) -> Result<(), VerificationError> {
        self.check_count(format!("at least {}", times), |actual| actual >= times)
    }

    pub fn expect_called_at_most(&self, times: usize) -> Result<(), VerificationError> {
        self.check_count(format!("at most {}", times), |actual| actual <= times)
    }

    pub fn expect_called_with(&self, args: &[Value]) -> Result<(), VerificationError> {
        let calls = self.calls();
        if calls.iter().any(|record| record.args == args) {
            return Ok(());
        }
        if calls.is_empty() {
            return Err(VerificationError::NeverCalled {
                mock: self.mock.name().to_string(),
                method: self.method.clone(),
            });
        }

        let actual: Vec<String> = calls
            .iter()
            .map(|record| args_signature(&record.args))
            .collect();
        Err(VerificationError::ArgumentMismatch {
            mock: self.mock.name().to_string(),
            method: self.method.clone(),
            expected: args_signature(args),
            actual: actual.join(", "),
        })
    }

    fn check_count(
        &self,
        expected: String,
        accept: impl Fn(usize) -> bool,
    ) -> Result<(), VerificationError> {
        let actual = self.get_call_count();
        if accept(actual) {
            Ok(())
        } else {
            Err(VerificationError::CallCount {
                mock: self.mock.name().to_string(),
                method: self.method.clone(),
                expected,
                actual,
            })
        }
    }
}
