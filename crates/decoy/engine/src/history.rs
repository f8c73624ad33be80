//! Call history: the append-only record of calls a fake received

use chrono::{DateTime, Utc};
use decoy_types::{InterceptedCall, ScopeId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// One entry of a fake's call history
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// Process-wide order of interception, shared by all fakes
    pub sequence: u64,
    /// Wall-clock time of interception
    pub recorded_at: DateTime<Utc>,
    pub call: InterceptedCall,
    /// Scope frames active on the intercepting thread, innermost last
    pub scopes: Vec<ScopeId>,
}

impl RecordedCall {
    /// Record `call`, taking the next sequence number.
    pub fn new(call: InterceptedCall, scopes: Vec<ScopeId>) -> Self {
        Self {
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::SeqCst),
            recorded_at: Utc::now(),
            call,
            scopes,
        }
    }

    /// Whether `scope` was active when the call was made.
    pub fn was_made_within(&self, scope: ScopeId) -> bool {
        self.scopes.contains(&scope)
    }
}

/// Thread-safe, append-only call log of one fake
#[derive(Debug, Default)]
pub struct CallHistory {
    calls: Mutex<Vec<RecordedCall>>,
}

impl CallHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `call`; the only mutation the history supports.
    pub fn append(&self, call: InterceptedCall, scopes: Vec<ScopeId>) -> RecordedCall {
        let mut calls = self.calls.lock();
        let recorded = RecordedCall::new(call, scopes);
        calls.push(recorded.clone());
        recorded
    }

    /// Number of calls recorded so far.
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    /// Frozen copy of the history in call order.
    pub fn snapshot(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Calls made while `scope` was active, in call order.
    pub fn calls_within(&self, scope: ScopeId) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|recorded| recorded.was_made_within(scope))
            .cloned()
            .collect()
    }
}
