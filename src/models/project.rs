use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Project lifecycle status. Transitions are forward-only; skipping a
/// middle state is allowed (`pending` → `completed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Pending,
    InProgress,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::Completed => "completed",
        }
    }

    fn rank(self) -> u8 {
        match self {
            ProjectStatus::Pending => 0,
            ProjectStatus::InProgress => 1,
            ProjectStatus::Completed => 2,
        }
    }

    pub fn can_transition_to(self, next: ProjectStatus) -> bool {
        next.rank() >= self.rank()
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embedded owning-client fields returned on project reads
/// (the store's `clients(name)` join).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub client_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub estimated_end_date: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    /// Present on list reads, absent on the row echoed back by an insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<ClientRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub client_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub estimated_end_date: Option<NaiveDate>,
}
