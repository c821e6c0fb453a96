//! New-Life library
//!
//! Local-first core of the New-Life productivity app: tasks, project
//! boards with cards, reminders, habits and the login gate, persisted to
//! an async key-value store.

pub mod app;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
