//! Reminders service
//!
//! Dated reminders. Nothing fires at the reminder's date; the list is
//! purely informational.

use super::collection::EntityCollection;
use crate::clock::{next_id, SharedClock};
use crate::database::{Reminder, Repository};
use crate::error::{require_text, AppError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Service for managing reminders
#[derive(Clone)]
pub struct RemindersService {
    reminders: EntityCollection<Reminder>,
    clock: SharedClock,
}

impl RemindersService {
    pub async fn load(repo: Repository, clock: SharedClock) -> Self {
        Self {
            reminders: EntityCollection::load(repo).await,
            clock,
        }
    }

    /// Create a new reminder
    pub async fn add_reminder(&self, text: &str, date: DateTime<Utc>) -> Result<Reminder> {
        require_text(text, "Reminder text cannot be empty")?;

        tracing::info!("Creating reminder for {}", date);

        self.reminders
            .insert_with(|existing| {
                Ok(Reminder {
                    id: next_id(self.clock.as_ref(), existing.iter().map(|r| r.id.as_str())),
                    text: text.trim().to_string(),
                    date,
                    completed: false,
                })
            })
            .await
    }

    pub async fn edit_reminder(
        &self,
        id: &str,
        text: &str,
        date: DateTime<Utc>,
    ) -> Result<Reminder> {
        require_text(text, "Reminder text cannot be empty")?;

        self.reminders
            .update(id, |reminder| {
                reminder.text = text.trim().to_string();
                reminder.date = date;
                Ok(reminder.clone())
            })
            .await
    }

    pub async fn toggle_reminder(&self, id: &str) -> Result<Reminder> {
        self.reminders
            .update(id, |reminder| {
                reminder.completed = !reminder.completed;
                Ok(reminder.clone())
            })
            .await
    }

    pub async fn delete_reminder(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting reminder: {}", id);
        self.reminders.remove(id).await?;
        Ok(())
    }

    pub async fn list_reminders(&self) -> Vec<Reminder> {
        self.reminders.snapshot().await
    }

    /// Reminders not yet marked done
    pub async fn list_pending(&self) -> Vec<Reminder> {
        self.reminders
            .snapshot()
            .await
            .into_iter()
            .filter(|r| !r.completed)
            .collect()
    }

    /// Parse user-entered date text in the clock's local offset.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM` and a bare `YYYY-MM-DD`
    /// (local midnight).
    pub fn parse_date(&self, raw: &str) -> Result<DateTime<Utc>> {
        parse_reminder_date(raw, self.clock.now().offset())
    }
}

pub fn parse_reminder_date<Tz: TimeZone>(raw: &str, zone: &Tz) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    require_text(raw, "Reminder date cannot be empty")?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let local = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| AppError::validation(format!("Invalid date: {}", raw)))?;

    zone.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::validation(format!("Invalid date: {}", raw)))
}
