//! Entity models
//!
//! Rust structs for the persisted collections. Field names serialize in
//! camelCase to stay compatible with data already on the device.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::local_date;

/// A standalone to-do item on the home screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// Completion figures derived from the current task list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    pub completed: usize,
    pub total: usize,
    /// Rounded to the nearest whole percent, 0 when there are no tasks
    pub percentage: u32,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        let total = tasks.len();
        let percentage = if total > 0 {
            (completed as f64 / total as f64 * 100.0).round() as u32
        } else {
            0
        };

        Self {
            completed,
            total,
            percentage,
        }
    }
}

/// A dated reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub text: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

/// Habit priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

/// A daily habit with streak tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub best_streak: u32,
    /// Completed today; cleared by the daily rollover
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub last_completed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    pub fn new(id: String, name: String, priority: Priority, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            priority,
            streak: 0,
            best_streak: 0,
            completed: false,
            last_completed: None,
            created_at,
        }
    }

    /// Flip today's completion.
    ///
    /// Completing bumps the streak, stamps `last_completed` and lifts
    /// `best_streak`. Un-completing drops the streak by one (never below
    /// zero) and leaves the date and best streak alone.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        if self.completed {
            self.completed = false;
            self.streak = self.streak.saturating_sub(1);
        } else {
            self.completed = true;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
            self.last_completed = Some(now);
        }
    }

    /// Whether the daily checkbox must be cleared on `today`
    pub fn is_stale(&self, today: NaiveDate, offset: &FixedOffset) -> bool {
        match self.last_completed {
            Some(last) => local_date(last, offset) < today,
            None => false,
        }
    }
}

/// A registered account in the user list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// Argon2 PHC string, or plaintext for entries saved by older builds
    pub password: String,
    pub avatar: String,
}

/// The logged-in identity cached between launches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub avatar: String,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_task_stats() {
        let tasks = vec![
            Task { id: "1".into(), text: "a".into(), completed: true },
            Task { id: "2".into(), text: "b".into(), completed: false },
            Task { id: "3".into(), text: "c".into(), completed: false },
        ];
        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.percentage, 33);

        assert_eq!(TaskStats::from_tasks(&[]).percentage, 0);
    }

    #[test]
    fn test_habit_toggle_on_off_restores_streak() {
        let mut habit = Habit::new("1".into(), "Read".into(), Priority::High, ts("2024-05-01T08:00:00Z"));
        habit.streak = 4;
        habit.best_streak = 6;

        habit.toggle(ts("2024-05-01T09:00:00Z"));
        assert_eq!(habit.streak, 5);
        assert_eq!(habit.best_streak, 6);
        assert!(habit.completed);

        habit.toggle(ts("2024-05-01T09:05:00Z"));
        assert_eq!(habit.streak, 4);
        assert_eq!(habit.best_streak, 6);
        assert!(!habit.completed);
        // The completion stamp is one-way
        assert_eq!(habit.last_completed, Some(ts("2024-05-01T09:00:00Z")));
    }

    #[test]
    fn test_habit_best_streak_never_below_streak() {
        let mut habit = Habit::new("1".into(), "Run".into(), Priority::Low, ts("2024-05-01T08:00:00Z"));
        let mut now = ts("2024-05-01T08:00:00Z");
        for step in 0..20 {
            habit.toggle(now);
            if step % 3 == 0 {
                // Simulate the rollover clearing the checkbox
                habit.completed = false;
            }
            now = now + chrono::Duration::hours(7);
            assert!(habit.best_streak >= habit.streak);
        }
    }

    #[test]
    fn test_untoggle_floors_at_zero() {
        let mut habit = Habit::new("1".into(), "Walk".into(), Priority::Medium, ts("2024-05-01T08:00:00Z"));
        habit.completed = true;
        habit.toggle(ts("2024-05-01T09:00:00Z"));
        assert_eq!(habit.streak, 0);
    }

    #[test]
    fn test_habit_json_shape() {
        let habit = Habit::new("1714550400000".into(), "Read".into(), Priority::High, ts("2024-05-01T08:00:00Z"));
        let json = serde_json::to_value(&habit).unwrap();
        assert_eq!(json["bestStreak"], 0);
        assert_eq!(json["priority"], "high");
        assert!(json["lastCompleted"].is_null());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_session_ignores_stored_password() {
        let session: Session =
            serde_json::from_str(r#"{"username":"ana","password":"pw","avatar":"a.png"}"#).unwrap();
        assert_eq!(session.username, "ana");
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("High".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }
}
