//! In-memory `StoreBackend` for the test suite and offline development.
//!
//! Mirrors the hosted store's observable behavior: rows get sequential ids,
//! list reads are ordered the same way, and project reads embed the owning
//! client's name.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{StoreBackend, StoreError};
use crate::models::{
    Client, ClientPatch, ClientRef, NewClient, NewProject, NewTask, Project, ProjectStatus, Task,
    TaskPatch, TaskStatus,
};

#[derive(Default)]
pub struct MemStore {
    clients: Mutex<Vec<Client>>,
    projects: Mutex<Vec<Project>>,
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicI64,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl StoreBackend for MemStore {
    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        let mut rows = self.clients.lock().await.clone();
        rows.sort_by_key(|c| Reverse((c.created_at, c.id)));
        Ok(rows)
    }

    async fn insert_client(&self, new: NewClient) -> Result<Client, StoreError> {
        let row = Client {
            id: self.next_id(),
            name: new.name,
            email: new.email,
            industry: new.industry,
            website: new.website,
            created_at: Utc::now(),
        };
        self.clients.lock().await.push(row.clone());
        Ok(row)
    }

    async fn update_client(&self, id: i64, patch: ClientPatch) -> Result<Client, StoreError> {
        let mut rows = self.clients.lock().await;
        let row = rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("client {id}")))?;
        if let Some(name) = patch.name {
            row.name = name;
        }
        if let Some(email) = patch.email {
            row.email = Some(email);
        }
        if let Some(industry) = patch.industry {
            row.industry = Some(industry);
        }
        if let Some(website) = patch.website {
            row.website = Some(website);
        }
        Ok(row.clone())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let clients = self.clients.lock().await;
        let mut rows: Vec<Project> = self
            .projects
            .lock()
            .await
            .iter()
            .map(|p| {
                let mut p = p.clone();
                p.clients = clients
                    .iter()
                    .find(|c| c.id == p.client_id)
                    .map(|c| ClientRef {
                        name: c.name.clone(),
                    });
                p
            })
            .collect();
        rows.sort_by_key(|p| Reverse((p.created_at, p.id)));
        Ok(rows)
    }

    async fn insert_project(&self, new: NewProject) -> Result<Project, StoreError> {
        // The hosted store enforces the client FK; mirror that here.
        if !self.clients.lock().await.iter().any(|c| c.id == new.client_id) {
            return Err(StoreError::Rejected {
                status: 409,
                message: format!("client {} does not exist", new.client_id),
            });
        }
        let row = Project {
            id: self.next_id(),
            client_id: new.client_id,
            name: new.name,
            description: new.description,
            budget: new.budget,
            start_date: new.start_date,
            estimated_end_date: new.estimated_end_date,
            status: ProjectStatus::Pending,
            created_at: Utc::now(),
            clients: None,
        };
        self.projects.lock().await.push(row.clone());
        Ok(row)
    }

    async fn list_tasks(&self, project_id: Option<i64>) -> Result<Vec<Task>, StoreError> {
        let mut rows: Vec<Task> = self
            .tasks
            .lock()
            .await
            .iter()
            .filter(|t| project_id.map_or(true, |pid| t.project_id == pid))
            .cloned()
            .collect();
        rows.sort_by_key(|t| (t.created_at, t.id));
        Ok(rows)
    }

    async fn get_task(&self, id: i64) -> Result<Task, StoreError> {
        self.tasks
            .lock()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("task {id}")))
    }

    async fn insert_task(&self, new: NewTask) -> Result<Task, StoreError> {
        if !self
            .projects
            .lock()
            .await
            .iter()
            .any(|p| p.id == new.project_id)
        {
            return Err(StoreError::Rejected {
                status: 409,
                message: format!("project {} does not exist", new.project_id),
            });
        }
        let row = Task {
            id: self.next_id(),
            project_id: new.project_id,
            title: new.title,
            status: TaskStatus::Todo,
            created_at: Utc::now(),
        };
        self.tasks.lock().await.push(row.clone());
        Ok(row)
    }

    async fn update_task(&self, id: i64, patch: TaskPatch) -> Result<Task, StoreError> {
        let mut rows = self.tasks.lock().await;
        let row = rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("task {id}")))?;
        if let Some(title) = patch.title {
            row.title = title;
        }
        if let Some(status) = patch.status {
            row.status = status;
        }
        Ok(row.clone())
    }

    async fn count_pending_tasks(&self) -> Result<u64, StoreError> {
        Ok(self
            .tasks
            .lock()
            .await
            .iter()
            .filter(|t| t.status.is_pending())
            .count() as u64)
    }
}
