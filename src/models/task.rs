use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task status. A task counts as pending until it reaches `done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn is_pending(self) -> bool {
        !matches!(self, TaskStatus::Done)
    }

    fn rank(self) -> u8 {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }

    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        next.rank() >= self.rank()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

/// New tasks always start in `todo`; the status is set by the store layer,
/// not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub project_id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_is_the_only_non_pending_status() {
        assert!(TaskStatus::Todo.is_pending());
        assert!(TaskStatus::InProgress.is_pending());
        assert!(!TaskStatus::Done.is_pending());
    }

    #[test]
    fn done_tasks_cannot_reopen() {
        assert!(TaskStatus::Todo.can_transition_to(TaskStatus::Done));
        assert!(TaskStatus::Todo.can_transition_to(TaskStatus::InProgress));
        assert!(!TaskStatus::Done.can_transition_to(TaskStatus::Todo));
        assert!(!TaskStatus::Done.can_transition_to(TaskStatus::InProgress));
    }
}
