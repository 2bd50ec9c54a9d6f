//! Question route handler.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::step_to_string;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DocsQueryInput {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocsQueryOutput {
    pub input: String,
    pub output: String,
    pub intermediate_steps: Vec<String>,
}

pub async fn query_doc_agent(
    State(state): State<AppState>,
    Json(query): Json<DocsQueryInput>,
) -> Result<Json<DocsQueryOutput>, (StatusCode, String)> {
    if query.text.trim().is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "Query text is empty".to_string()));
    }

    let agent = state.agent.clone();
    let text = query.text.as_str();
    let answer = state
        .agent_retry
        .run(|_| {
            let agent = agent.clone();
            async move { agent.invoke(text).await }
        })
        .await
        .map_err(|e| {
            warn!(attempts = e.attempts(), error = %e, "Agent invocation failed");
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    info!(steps = answer.intermediate_steps.len(), "Answered query");

    Ok(Json(DocsQueryOutput {
        input: query.text.clone(),
        output: answer.output,
        intermediate_steps: answer.intermediate_steps.iter().map(step_to_string).collect(),
    }))
}
