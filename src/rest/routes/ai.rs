// rest/routes/ai.rs — timeline prediction and contract drafting.
//
// Both endpoints mask reasoning-service failures: the fallback payloads are
// produced inside the ai module, so these handlers only ever fail on bad
// input.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::ai::contract::{self, ContractInput};
use crate::ai::timeline::{self, TimelinePrediction};
use crate::rest::error::ApiError;
use crate::AppContext;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictTimelineRequest {
    pub project_description: Option<String>,
    /// Validated by hand: a missing field, a non-array, and an empty array
    /// must all report the same 400.
    #[serde(default)]
    pub tasks: Option<Value>,
}

pub async fn predict_timeline(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<PredictTimelineRequest>,
) -> Result<Json<TimelinePrediction>, ApiError> {
    let tasks: Vec<String> = match body.tasks {
        Some(Value::Array(items)) if !items.is_empty() => {
            items.iter().map(field_text).collect()
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Please provide a list of tasks.".to_string(),
            ))
        }
    };

    let prediction =
        timeline::predict(&ctx.reasoning, body.project_description.as_deref(), &tasks).await;
    Ok(Json(prediction))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContractRequest {
    pub client_name: String,
    pub project_name: String,
    pub scope: String,
    /// The UI sends the budget as a number; tolerate strings too.
    pub budget: Value,
    pub estimated_date: String,
}

pub async fn generate_contract_content(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<GenerateContractRequest>,
) -> Json<Value> {
    let input = ContractInput {
        client_name: body.client_name,
        project_name: body.project_name,
        scope: body.scope,
        budget: field_text(&body.budget),
        estimated_date: body.estimated_date,
    };
    let content = contract::draft(&ctx.reasoning, &input).await;
    Json(json!({ "content": content }))
}

fn field_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_renders_without_json_quoting() {
        assert_eq!(field_text(&json!(12000)), "12000");
        assert_eq!(field_text(&json!("12,000")), "12,000");
        assert_eq!(field_text(&json!(9500.5)), "9500.5");
    }
}
