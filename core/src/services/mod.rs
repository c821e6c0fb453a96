//! Services module
//!
//! High-level business logic, one service per persisted collection, plus
//! the session and the habit rollover timer.

pub mod collection;
pub mod habits;
pub mod ledger;
pub mod projects;
pub mod reminders;
pub mod rollover;
pub mod session;
pub mod tasks;

pub use collection::EntityCollection;
pub use habits::HabitsService;
pub use ledger::EntryKind;
pub use projects::ProjectsService;
pub use reminders::RemindersService;
pub use rollover::RolloverScheduler;
pub use session::SessionService;
pub use tasks::TasksService;
