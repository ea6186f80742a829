//! Mock domain entities
//!
//! Call records and stub table entries for call-recording test doubles.
//! Arguments and return values are dynamically typed JSON values.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Label given to mocks created without a name
pub const DEFAULT_MOCK_NAME: &str = "MockObject";

/// Unique identifier for a mock handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MockId(pub Uuid);

impl MockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One invocation recorded on a mock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub method: String,
    pub args: Vec<Value>,
    pub timestamp: DateTime<Utc>,
}

impl CallRecord {
    pub fn new(method: &str, args: &[Value]) -> Self {
        Self {
            method: method.to_string(),
            args: args.to_vec(),
            timestamp: Utc::now(),
        }
    }
}

/// Canonical signature of an argument list, used to key exact-args stubs
pub fn args_signature(args: &[Value]) -> String {
    Value::Array(args.to_vec()).to_string()
}

/// Key into a mock's stub table
///
/// A key without a signature matches any call to the method; a key with one
/// only matches calls whose arguments serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StubKey {
    pub method: String,
    pub signature: Option<String>,
}

impl StubKey {
    pub fn method(method: &str) -> Self {
        Self {
            method: method.to_string(),
            signature: None,
        }
    }

    pub fn exact(method: &str, args: &[Value]) -> Self {
        Self {
            method: method.to_string(),
            signature: Some(args_signature(args)),
        }
    }
}

impl fmt::Display for StubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.signature {
            Some(signature) => write!(f, "{}{}", self.method, signature),
            None => write!(f, "{}", self.method),
        }
    }
}

/// Computation run in place of a literal stub value
pub type StubCallable = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// What a stub resolves to
#[derive(Clone)]
pub enum StubResponse {
    Value(Value),
    Call(StubCallable),
}

impl fmt::Debug for StubResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StubResponse::Value(value) => f.debug_tuple("Value").field(value).finish(),
            StubResponse::Call(_) => f.write_str("Call(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_key_distinguishes_arguments() {
        let a = StubKey::exact("add", &[json!(2), json!(3)]);
        let b = StubKey::exact("add", &[json!(10), json!(20)]);
        let same = StubKey::exact("add", &[json!(2), json!(3)]);

        assert_ne!(a, b);
        assert_eq!(a, same);
        assert_ne!(a, StubKey::method("add"));
    }

    #[test]
    fn key_display_appends_signature() {
        assert_eq!(
            StubKey::exact("log", &[json!("a")]).to_string(),
            "log[\"a\"]"
        );
        assert_eq!(StubKey::method("log").to_string(), "log");
    }

    #[test]
    fn call_record_copies_arguments() {
        let mut args = vec![json!(1)];
        let record = CallRecord::new("push", &args);
        args.push(json!(2));

        assert_eq!(record.args, vec![json!(1)]);
        assert_eq!(record.method, "push");
    }
}
