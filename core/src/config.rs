//! Application configuration constants
//!
//! Central location for storage keys, palettes, defaults and the runtime
//! configuration resolved from the environment.

use std::path::PathBuf;
use std::time::Duration;

// ===== Storage Keys =====

/// Key holding the standalone task list
pub const TASKS_KEY: &str = "@todoList";
/// Key holding every project with its nested cards
pub const PROJECTS_KEY: &str = "@projects";
/// Key holding the reminders collection
pub const REMINDERS_KEY: &str = "@reminders";
/// Key holding the habits collection
pub const HABITS_KEY: &str = "@habits";
/// Key holding the registered user list
pub const USERS_KEY: &str = "@users";
/// Key holding the currently logged-in session
pub const SESSION_KEY: &str = "@loggedInUser";

/// Prefix of the per-project card lists written by the older project screen.
/// The full key is `cards_<project name>`.
pub const LEGACY_CARDS_KEY_PREFIX: &str = "cards_";

// ===== Projects =====

/// Colors a project may be painted with
pub const PROJECT_COLORS: &[&str] = &[
    "#F5F5F5", "#E8F5E9", "#E3F2FD", "#FFF9C4", "#FFEBEE", "#F3E5F5", "#E0F7FA", "#FFF3E0",
];

/// Color assigned to newly created projects (light green)
pub const DEFAULT_PROJECT_COLOR: &str = "#E8F5E9";

/// Title given to todo cards
pub const DEFAULT_TODO_CARD_TITLE: &str = "Tarefas";

/// Title given to financial cards and their ledgers
pub const DEFAULT_FINANCIAL_TITLE: &str = "Finanças";

// ===== Session =====

/// Avatar assigned when a user registers without choosing one
pub const DEFAULT_AVATAR_URL: &str = "https://randomuser.me/api/portraits/women/44.jpg";

// ===== Habits =====

/// Fallback wait when the next local midnight cannot be computed
pub const ROLLOVER_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest the rollover timer sleeps before re-reading the local date.
/// A UTC offset change between midnights is picked up within this window.
pub const ROLLOVER_RECHECK: Duration = Duration::from_secs(60 * 60);

// ===== Runtime =====

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "NEWLIFE_DATA_DIR";

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "newlife=debug,info";

/// Runtime configuration for the daemon
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the key-value store files
    pub data_dir: PathBuf,
    pub log_filter: String,
}

impl AppConfig {
    /// Resolve configuration from the process environment
    pub fn from_env() -> Self {
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let log_filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Self {
            data_dir,
            log_filter,
        }
    }

    /// Directory the key-value store writes into
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newlife")
}

/// Whether `color` belongs to the project palette
pub fn is_palette_color(color: &str) -> bool {
    PROJECT_COLORS.iter().any(|c| c.eq_ignore_ascii_case(color))
}
