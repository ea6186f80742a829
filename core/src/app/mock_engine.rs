//! Mock engine
//!
//! Creates call-recording mock handles and resolves their return values.
//!
//! Resolution order for a call is:
//! 1. a stub keyed on the method and the exact serialized arguments
//! 2. a stub keyed on the method alone
//! 3. a default derived from the method name (see [`default_return_for`])
//!
//! Mock operations never fail. Unknown methods resolve to their default and
//! verification queries on unused methods simply report no calls.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::app::stub_builder::StubBuilder;
use crate::app::verifier::Verifier;
use crate::domain::entities::{CallRecord, MockId, StubKey, StubResponse, DEFAULT_MOCK_NAME};

/// Default return value for an unstubbed method, chosen by naming convention
pub fn default_return_for(method: &str) -> Value {
    if method.starts_with("get_") {
        Value::Null
    } else if ["is_", "has_", "can_"]
        .iter()
        .any(|prefix| method.starts_with(prefix))
    {
        Value::Bool(false)
    } else if method.starts_with("count") || method.starts_with("size") {
        Value::from(0)
    } else {
        Value::Null
    }
}

#[derive(Default)]
struct MockState {
    call_log: Vec<CallRecord>,
    stub_table: HashMap<StubKey, StubResponse>,
}

struct MockInner {
    id: MockId,
    name: String,
    state: Mutex<MockState>,
}

/// A call-recording test double
///
/// Handles are cheap to clone; clones share the same call log and stubs.
#[derive(Clone)]
pub struct MockHandle {
    inner: Arc<MockInner>,
}

impl MockHandle {
    pub fn new(name: &str) -> Self {
        let name = if name.is_empty() {
            DEFAULT_MOCK_NAME
        } else {
            name
        };
        Self {
            inner: Arc::new(MockInner {
                id: MockId::new(),
                name: name.to_string(),
                state: Mutex::new(MockState::default()),
            }),
        }
    }

    pub fn id(&self) -> MockId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Invoke `method` on the mock, record the call and return the stubbed
    /// or default value.
    ///
    /// A callable stub runs after the lock is released, so it may call back
    /// into this mock.
    pub fn call(&self, method: &str, args: &[Value]) -> Value {
        let response = {
            let mut state = self.inner.state.lock();
            state.call_log.push(CallRecord::new(method, args));
            let response = state
                .stub_table
                .get(&StubKey::exact(method, args))
                .or_else(|| state.stub_table.get(&StubKey::method(method)))
                .cloned();
            response
        };

        match response {
            Some(StubResponse::Value(value)) => value,
            Some(StubResponse::Call(callable)) => callable(args),
            None => default_return_for(method),
        }
    }

    /// Start configuring a stub for `method`
    pub fn stub(&self, method: &str) -> StubBuilder {
        StubBuilder::new(self.clone(), method)
    }

    /// Query the calls made to `method`
    pub fn verify(&self, method: &str) -> Verifier {
        Verifier::new(self.clone(), method)
    }

    /// Clear the call log and every stub in one step
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        state.call_log.clear();
        state.stub_table.clear();
    }

    /// Every recorded call, oldest first
    pub fn calls(&self) -> Vec<CallRecord> {
        self.inner.state.lock().call_log.clone()
    }

    /// Recorded calls to one method, oldest first
    pub fn calls_to(&self, method: &str) -> Vec<CallRecord> {
        self.inner
            .state
            .lock()
            .call_log
            .iter()
            .filter(|record| record.method == method)
            .cloned()
            .collect()
    }

    pub fn stub_count(&self) -> usize {
        self.inner.state.lock().stub_table.len()
    }

    /// Whether both handles refer to the same mock
    pub fn same_mock(&self, other: &MockHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn install_stub(&self, key: StubKey, response: StubResponse) {
        tracing::debug!(mock = %self.inner.name, stub = %key, "Stub installed");
        self.inner.state.lock().stub_table.insert(key, response);
    }
}

impl std::fmt::Debug for MockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}

/// Creates and tracks the mocks of one test suite
#[derive(Default)]
pub struct MockEngine {
    mocks: Mutex<Vec<MockHandle>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh mock. An empty name gets the generic label.
    pub fn create(&self, name: &str) -> MockHandle {
        let handle = MockHandle::new(name);
        tracing::debug!(mock = %handle.name(), id = %handle.id(), "Mock created");
        self.mocks.lock().push(handle.clone());
        handle
    }

    pub fn call(&self, handle: &MockHandle, method: &str, args: &[Value]) -> Value {
        handle.call(method, args)
    }

    pub fn stub(&self, handle: &MockHandle, method: &str) -> StubBuilder {
        handle.stub(method)
    }

    pub fn verify(&self, handle: &MockHandle, method: &str) -> Verifier {
        handle.verify(method)
    }

    /// Reset one mock; other mocks are untouched
    pub fn reset(&self, handle: &MockHandle) {
        handle.reset();
    }

    /// Reset every mock and stop tracking them. Returns how many were cleared.
    pub fn reset_all(&self) -> usize {
        let mocks: Vec<MockHandle> = std::mem::take(&mut *self.mocks.lock());
        for mock in &mocks {
            mock.reset();
        }
        tracing::debug!(count = mocks.len(), "Mocks cleaned up");
        mocks.len()
    }

    /// First tracked mock with the given name
    pub fn find(&self, name: &str) -> Option<MockHandle> {
        self.mocks
            .lock()
            .iter()
            .find(|mock| mock.name() == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.mocks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
