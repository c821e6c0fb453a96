//! Tasks service
//!
//! The standalone to-do list on the home screen.

use super::collection::EntityCollection;
use crate::clock::{next_id, SharedClock};
use crate::database::{Repository, Task, TaskStats};
use crate::error::{require_text, Result};

/// Service for managing tasks
#[derive(Clone)]
pub struct TasksService {
    tasks: EntityCollection<Task>,
    clock: SharedClock,
}

impl TasksService {
    pub async fn load(repo: Repository, clock: SharedClock) -> Self {
        Self {
            tasks: EntityCollection::load(repo).await,
            clock,
        }
    }

    /// Create a new task
    pub async fn add_task(&self, text: &str) -> Result<Task> {
        require_text(text, "Task text cannot be empty")?;

        let task = self
            .tasks
            .insert_with(|existing| {
                Ok(Task {
                    id: next_id(self.clock.as_ref(), existing.iter().map(|t| t.id.as_str())),
                    text: text.trim().to_string(),
                    completed: false,
                })
            })
            .await?;

        tracing::info!("Task created: {}", task.id);
        Ok(task)
    }

    pub async fn edit_task(&self, id: &str, text: &str) -> Result<Task> {
        require_text(text, "Task text cannot be empty")?;

        self.tasks
            .update(id, |task| {
                task.text = text.trim().to_string();
                Ok(task.clone())
            })
            .await
    }

    /// Flip completion
    pub async fn toggle_task(&self, id: &str) -> Result<Task> {
        let task = self
            .tasks
            .update(id, |task| {
                task.completed = !task.completed;
                Ok(task.clone())
            })
            .await?;

        tracing::debug!("Task {} completed: {}", task.id, task.completed);
        Ok(task)
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting task: {}", id);
        self.tasks.remove(id).await?;
        Ok(())
    }

    /// All tasks in insertion order
    pub async fn list_tasks(&self) -> Vec<Task> {
        self.tasks.snapshot().await
    }

    /// Completion figures, derived from the current list on every call
    pub async fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks.snapshot().await)
    }
}
