//! Stub builder
//!
//! Fluent helper bound to one (mock, method) pair. `with_args` narrows the
//! stub to an exact argument list; `then_return` / `then_call` write it into
//! the mock's stub table.

use std::sync::Arc;

use serde_json::Value;

use crate::app::mock_engine::MockHandle;
use crate::domain::entities::{StubKey, StubResponse};

pub struct StubBuilder {
    mock: MockHandle,
    method: String,
    args: Option<Vec<Value>>,
}

impl StubBuilder {
    pub(crate) fn new(mock: MockHandle, method: &str) -> Self {
        Self {
            mock,
            method: method.to_string(),
            args: None,
        }
    }

    /// Only match calls with exactly these arguments
    pub fn with_args(mut self, args: &[Value]) -> Self {
        self.args = Some(args.to_vec());
        self
    }

    /// Resolve matching calls to a fixed value
    pub fn then_return(self, value: impl Into<Value>) {
        let key = self.key();
        self.mock.install_stub(key, StubResponse::Value(value.into()));
    }

    /// Resolve matching calls by invoking `callable` with the call arguments
    pub fn then_call<F>(self, callable: F)
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        let key = self.key();
        self.mock
            .install_stub(key, StubResponse::Call(Arc::new(callable)));
    }

    fn key(&self) -> StubKey {
        match &self.args {
            Some(args) => StubKey::exact(&self.method, args),
            None => StubKey::method(&self.method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_args_narrows_the_key() {
        let mock = MockHandle::new("Save");
        let builder = mock.stub("load").with_args(&[json!("slot1")]);
        assert_eq!(builder.key(), StubKey::exact("load", &[json!("slot1")]));

        let builder = mock.stub("load");
        assert_eq!(builder.key(), StubKey::method("load"));
    }

    #[test]
    fn then_return_accepts_structured_values() {
        let mock = MockHandle::new("Save");
        mock.stub("load")
            .with_args(&[json!("slot1")])
            .then_return(json!({"level": 3, "items": ["key"]}));

        assert_eq!(
            mock.call("load", &[json!("slot1")]),
            json!({"level": 3, "items": ["key"]})
        );
        assert_eq!(mock.call("load", &[json!("slot2")]), Value::Null);
    }
}
