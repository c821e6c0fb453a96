//! Habits service
//!
//! Daily habits with streak counters, plus the rollover pass that clears
//! yesterday's checkboxes.

use super::collection::EntityCollection;
use crate::clock::{next_id, SharedClock};
use crate::database::{Habit, Priority, Repository};
use crate::error::{require_text, Result};
use chrono::Utc;

/// Service for managing habits
#[derive(Clone)]
pub struct HabitsService {
    habits: EntityCollection<Habit>,
    clock: SharedClock,
}

impl HabitsService {
    pub async fn load(repo: Repository, clock: SharedClock) -> Self {
        Self {
            habits: EntityCollection::load(repo).await,
            clock,
        }
    }

    /// Create a new habit with zeroed streaks
    pub async fn add_habit(&self, name: &str, priority: Priority) -> Result<Habit> {
        require_text(name, "Habit name cannot be empty")?;

        let habit = self
            .habits
            .insert_with(|existing| {
                let id = next_id(self.clock.as_ref(), existing.iter().map(|h| h.id.as_str()));
                let created_at = self.clock.now().with_timezone(&Utc);
                Ok(Habit::new(id, name.trim().to_string(), priority, created_at))
            })
            .await?;

        tracing::info!("Habit created: {} ({})", habit.name, habit.priority.label());
        Ok(habit)
    }

    pub async fn edit_habit(&self, id: &str, name: &str, priority: Priority) -> Result<Habit> {
        require_text(name, "Habit name cannot be empty")?;

        self.habits
            .update(id, |habit| {
                habit.name = name.trim().to_string();
                habit.priority = priority;
                Ok(habit.clone())
            })
            .await
    }

    /// Flip today's completion and adjust the streak counters
    pub async fn toggle_habit(&self, id: &str) -> Result<Habit> {
        let now = self.clock.now().with_timezone(&Utc);

        let habit = self
            .habits
            .update(id, |habit| {
                habit.toggle(now);
                Ok(habit.clone())
            })
            .await?;

        tracing::debug!(
            "Habit {} completed: {} (streak {}, best {})",
            habit.id,
            habit.completed,
            habit.streak,
            habit.best_streak
        );
        Ok(habit)
    }

    pub async fn delete_habit(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting habit: {}", id);
        self.habits.remove(id).await?;
        Ok(())
    }

    pub async fn list_habits(&self) -> Vec<Habit> {
        self.habits.snapshot().await
    }

    /// Clear `completed` on every habit last completed before today.
    ///
    /// Streak counters are left alone. Returns how many habits changed.
    pub async fn rollover(&self) -> usize {
        let now = self.clock.now();
        let today = now.date_naive();
        let offset = *now.offset();

        let cleared = self
            .habits
            .update_all(|habits| {
                let mut cleared = 0;
                for habit in habits.iter_mut() {
                    if habit.completed && habit.is_stale(today, &offset) {
                        habit.completed = false;
                        cleared += 1;
                    }
                }
                cleared
            })
            .await;

        tracing::info!("Habit rollover for {}: {} cleared", today, cleared);
        cleared
    }
}
