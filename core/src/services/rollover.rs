//! Habit rollover scheduler
//!
//! Runs one rollover pass immediately and then one each time the local
//! date changes. The timer sleeps until the next local midnight, but never
//! longer than [`ROLLOVER_RECHECK`], and re-reads the clock on every wake,
//! so a change of UTC offset moves the next pass with it. The next fire
//! time is never persisted.

use super::habits::HabitsService;
use crate::clock::{until_next_midnight, SharedClock};
use crate::config::ROLLOVER_RECHECK;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Owned, restartable background task driving [`HabitsService::rollover`]
#[derive(Clone)]
pub struct RolloverScheduler {
    habits: HabitsService,
    clock: SharedClock,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl RolloverScheduler {
    pub fn new(habits: HabitsService, clock: SharedClock) -> Self {
        Self {
            habits,
            clock,
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Arm the timer, replacing any previously running one
    pub fn start(&self) {
        let habits = self.habits.clone();
        let clock = self.clock.clone();

        let handle = tokio::spawn(async move {
            loop {
                let day = clock.today();
                habits.rollover().await;

                let wait = until_next_midnight(clock.now());
                tracing::info!("Next habit rollover in {}s", wait.as_secs());

                while clock.today() == day {
                    let wait = until_next_midnight(clock.now()).min(ROLLOVER_RECHECK);
                    tokio::time::sleep(wait).await;
                }
            }
        });

        if let Some(previous) = self.lock_task().replace(handle) {
            previous.abort();
            tracing::debug!("Replaced running rollover timer");
        }
    }

    /// Stop the timer; a no-op when it is not running
    pub fn cancel(&self) {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
            tracing::info!("Habit rollover timer cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_task()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|e| e.into_inner())
    }
}
