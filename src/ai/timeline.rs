//! Timeline prediction.
//!
//! Builds the project-manager prompt, asks the reasoning service for a
//! JSON-shaped estimate, and repairs the answer (deriving the completion
//! date when the service leaves it out). Any failure of the outbound call
//! is masked: the caller always gets a well-formed prediction, with the
//! real error logged at warn level.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{AiError, ReasoningClient};

const SYSTEM_PROMPT: &str = "You are an expert Technical Project Manager.\n\
    Analyze the provided project description and list of tasks.\n\
    Estimate the total time required in days.\n\
    Identify potential risks and assign a \"risk factor\" (Low, Medium, High).\n\
    Provide a brief explanation for the estimate.\n\n\
    Return the response in JSON format with the following structure:\n\
    {\n\
      \"estimatedDays\": number,\n\
      \"riskFactor\": \"Low\" | \"Medium\" | \"High\",\n\
      \"explanation\": \"string\",\n\
      \"completionDate\": \"ISO date string (assuming start date is today)\"\n\
    }";

const FALLBACK_EXPLANATION: &str = "⚠️ API quota exceeded — this is a demo estimation. \
    In a real scenario the AI would analyze your tasks for precision.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFactor {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePrediction {
    pub estimated_days: i64,
    pub risk_factor: RiskFactor,
    pub explanation: String,
    pub completion_date: NaiveDate,
}

/// What the service is asked to return. `completionDate` is optional and
/// free-form; [`repair`] normalizes it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrediction {
    estimated_days: f64,
    risk_factor: RiskFactor,
    explanation: String,
    #[serde(default)]
    completion_date: Option<String>,
}

/// Estimate a timeline for a non-empty task list. Never fails: a failed or
/// malformed completion yields the synthesized placeholder instead.
pub async fn predict(
    client: &ReasoningClient,
    description: Option<&str>,
    tasks: &[String],
) -> TimelinePrediction {
    match attempt(client, description, tasks).await {
        Ok(prediction) => prediction,
        Err(err) => {
            warn!(err = %err, "timeline prediction failed — returning fallback estimate");
            fallback()
        }
    }
}

async fn attempt(
    client: &ReasoningClient,
    description: Option<&str>,
    tasks: &[String],
) -> Result<TimelinePrediction, AiError> {
    let content = client
        .complete(SYSTEM_PROMPT, &user_prompt(description, tasks), true)
        .await?;
    let raw: RawPrediction = serde_json::from_str(&content)?;
    Ok(repair(raw, Utc::now().date_naive()))
}

fn user_prompt(description: Option<&str>, tasks: &[String]) -> String {
    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("N/A");
    let mut out = format!("Project Description: {description}\n\nTasks:\n");
    for (i, task) in tasks.iter().enumerate() {
        out.push_str(&format!("{}. {task}\n", i + 1));
    }
    out
}

fn repair(raw: RawPrediction, today: NaiveDate) -> TimelinePrediction {
    let estimated_days = (raw.estimated_days.ceil() as i64).max(1);
    let completion_date = raw
        .completion_date
        .as_deref()
        .and_then(parse_loose_date)
        .unwrap_or_else(|| today + Duration::days(estimated_days));
    TimelinePrediction {
        estimated_days,
        risk_factor: raw.risk_factor,
        explanation: raw.explanation,
        completion_date,
    }
}

/// The service answers with either a bare date or a full ISO timestamp.
fn parse_loose_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Synthesized placeholder used whenever the reasoning call fails: jittered
/// day count, fixed Medium risk, completion date derived the same way as a
/// genuine answer.
fn fallback() -> TimelinePrediction {
    let estimated_days = 5 + (time_jitter() % 20) as i64;
    TimelinePrediction {
        estimated_days,
        risk_factor: RiskFactor::Medium,
        explanation: FALLBACK_EXPLANATION.to_string(),
        completion_date: Utc::now().date_naive() + Duration::days(estimated_days),
    }
}

fn time_jitter() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let pid = std::process::id() as u64;
    // simple non-crypto jitter
    (ns as u64).wrapping_mul(1_000_003).wrapping_add(pid)
}
