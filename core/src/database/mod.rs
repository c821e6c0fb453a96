//! Database module
//!
//! This module provides all persisted-state functionality including:
//! - Model definitions
//! - Repository layer over the key-value store
//! - Migration of the legacy per-project card lists

pub mod migrations;
pub mod models;
pub mod project;
pub mod repository;

pub use models::*;
pub use project::*;
pub use repository::Repository;

use crate::config::{HABITS_KEY, PROJECTS_KEY, REMINDERS_KEY, TASKS_KEY, USERS_KEY};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record stored as one element of a JSON array under a fixed key
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Key the whole collection is written under
    const STORAGE_KEY: &'static str;
    /// Human-readable name used in logs and errors
    const NAME: &'static str;

    fn id(&self) -> &str;
}

impl Entity for Task {
    const STORAGE_KEY: &'static str = TASKS_KEY;
    const NAME: &'static str = "Task";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Project {
    const STORAGE_KEY: &'static str = PROJECTS_KEY;
    const NAME: &'static str = "Project";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Reminder {
    const STORAGE_KEY: &'static str = REMINDERS_KEY;
    const NAME: &'static str = "Reminder";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Habit {
    const STORAGE_KEY: &'static str = HABITS_KEY;
    const NAME: &'static str = "Habit";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Users are keyed by their (case-sensitive) username
impl Entity for User {
    const STORAGE_KEY: &'static str = USERS_KEY;
    const NAME: &'static str = "User";

    fn id(&self) -> &str {
        &self.username
    }
}
