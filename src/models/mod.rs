mod client;
mod project;
mod task;

pub use client::{Client, ClientPatch, NewClient};
pub use project::{ClientRef, NewProject, Project, ProjectStatus};
pub use task::{NewTask, Task, TaskPatch, TaskStatus};
