//! Question-answering agent.
//!
//! The agent decides which retrieval tool answers a question (graph query,
//! semantic search or reporter analytics) and composes the final answer. It
//! runs as a separate service; this module only talks to it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use newsgraph_core::{NewsGraphError, NewsGraphResult};

/// Final answer plus the trace of tool invocations that produced it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentAnswer {
    pub output: String,
    #[serde(default)]
    pub intermediate_steps: Vec<serde_json::Value>,
}

/// Anything that can answer a free-text question.
#[async_trait]
pub trait QueryAgent: Send + Sync {
    async fn invoke(&self, input: &str) -> NewsGraphResult<AgentAnswer>;
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    input: &'a str,
}

/// HTTP client for an agent service exposing `POST /invoke`.
#[derive(Clone)]
pub struct RemoteAgent {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteAgent {
    pub fn new(base_url: &str) -> Self {
        // Agent runs chain several LLM and database calls.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl QueryAgent for RemoteAgent {
    async fn invoke(&self, input: &str) -> NewsGraphResult<AgentAnswer> {
        let response = self
            .client
            .post(format!("{}/invoke", self.base_url))
            .json(&InvokeRequest { input })
            .send()
            .await
            .map_err(|e| NewsGraphError::Agent(format!("failed to reach agent service: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NewsGraphError::Agent(format!("agent service error ({status}): {body}")));
        }

        let answer: AgentAnswer = response
            .json()
            .await
            .map_err(|e| NewsGraphError::Agent(format!("invalid agent response: {e}")))?;

        debug!(steps = answer.intermediate_steps.len(), "Agent answered");
        Ok(answer)
    }
}

/// Render one intermediate step as text. Strings pass through unquoted.
pub fn step_to_string(step: &serde_json::Value) -> String {
    match step {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
