//! Application state.

use std::sync::Arc;
use std::time::Duration;

use newsgraph_core::RetryPolicy;

use crate::agent::QueryAgent;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn QueryAgent>,
    pub agent_retry: RetryPolicy,
}

impl AppState {
    /// Agent calls are retried 10 times, one second apart: tool failures are
    /// usually intermittent connection issues with external APIs.
    pub fn new(agent: Arc<dyn QueryAgent>) -> Self {
        Self {
            agent,
            agent_retry: RetryPolicy::fixed(10, Duration::from_secs(1)),
        }
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.agent_retry = policy;
        self
    }
}
