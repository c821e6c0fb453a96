//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::clock::{SharedClock, SystemClock};
use crate::config::AppConfig;
use crate::database::{Repository, TaskStats};
use crate::error::Result;
use crate::services::{
    HabitsService, ProjectsService, RemindersService, RolloverScheduler, SessionService,
    TasksService,
};
use crate::storage::{FileStore, SharedStore};
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub clock: SharedClock,
    pub tasks: TasksService,
    pub projects: ProjectsService,
    pub reminders: RemindersService,
    pub habits: HabitsService,
    pub session: SessionService,
    pub rollover: RolloverScheduler,
}

/// Headline figures for the home screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub tasks: TaskStats,
    pub projects: usize,
    pub pending_reminders: usize,
    pub habits_done_today: usize,
    pub habits: usize,
}

impl AppState {
    /// Load every collection from `store`.
    ///
    /// The rollover timer is created but not started.
    pub async fn load(store: SharedStore, clock: SharedClock) -> Self {
        let repo = Repository::new(store);

        let tasks = TasksService::load(repo.clone(), clock.clone()).await;
        let projects = ProjectsService::load(repo.clone(), clock.clone()).await;
        let reminders = RemindersService::load(repo.clone(), clock.clone()).await;
        let habits = HabitsService::load(repo.clone(), clock.clone()).await;
        let session = SessionService::load(repo.clone()).await;
        let rollover = RolloverScheduler::new(habits.clone(), clock.clone());

        Self {
            repo,
            clock,
            tasks,
            projects,
            reminders,
            habits,
            session,
            rollover,
        }
    }

    /// Figures derived from the current collections
    pub async fn dashboard(&self) -> Dashboard {
        let habits = self.habits.list_habits().await;

        Dashboard {
            tasks: self.tasks.stats().await,
            projects: self.projects.list_projects().await.len(),
            pending_reminders: self.reminders.list_pending().await.len(),
            habits_done_today: habits.iter().filter(|h| h.completed).count(),
            habits: habits.len(),
        }
    }

    /// Stop the timer and wait for queued writes
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down");
        self.rollover.cancel();
        self.repo.flush().await;

        let failed = self.repo.failed_writes();
        if failed > 0 {
            tracing::warn!("{} write(s) failed during this session", failed);
        }
    }
}

/// Application setup - called once on startup
pub async fn setup(config: &AppConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)?;

    let store = FileStore::new(config.store_dir());
    store.initialize().await?;

    let state = AppState::load(Arc::new(store), Arc::new(SystemClock)).await;
    state.rollover.start();

    match state.session.restore().await {
        Some(session) => tracing::info!("Starting on home screen for {}", session.username),
        None => tracing::info!("Starting on login screen"),
    }

    tracing::info!("Application initialized successfully");

    Ok(state)
}
