//! Legacy card migration
//!
//! An older project screen kept each project's cards under its own key,
//! `cards_<project name>`, in a flatter shape without ids or ordering:
//!
//! - `{"type": "todo", "todos": [{"text", "completed"}]}`
//! - `{"type": "note", "text"}`
//! - `{"type": "finance", "depositedValues": [{"name", "value"}]}`
//!
//! On startup those lists are converted to canonical cards and appended
//! after the project's existing cards. The caller drops the legacy keys once
//! the converted projects are persisted.

use super::project::{CardContent, FinancialCard, NoteFormatting, Project, TodoCard, TodoItem};
use super::repository::Repository;
use crate::clock::{next_id, Clock};
use crate::config::LEGACY_CARDS_KEY_PREFIX;
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LegacyCard {
    Todo {
        #[serde(default)]
        todos: Vec<LegacyTodo>,
    },
    Note {
        #[serde(default)]
        text: Option<String>,
    },
    Finance {
        #[serde(default, rename = "depositedValues")]
        deposited_values: Vec<LegacyDeposit>,
    },
}

#[derive(Debug, Deserialize)]
struct LegacyTodo {
    #[serde(default)]
    text: String,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct LegacyDeposit {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: LegacyAmount,
}

/// Amounts were usually numbers, occasionally raw input strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyAmount {
    Number(f64),
    Text(String),
}

impl Default for LegacyAmount {
    fn default() -> Self {
        LegacyAmount::Number(0.0)
    }
}

impl LegacyAmount {
    fn value(&self) -> Option<f64> {
        let value = match self {
            LegacyAmount::Number(n) => *n,
            LegacyAmount::Text(s) => s.trim().replace(',', ".").parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Storage key of a project's legacy card list
pub fn legacy_cards_key(project_name: &str) -> String {
    format!("{}{}", LEGACY_CARDS_KEY_PREFIX, project_name)
}

/// Import legacy card lists into `projects`.
///
/// Returns the legacy keys that were imported. Keys that fail to parse are
/// skipped and left in place. When several projects share a name, the
/// first one in the list receives the cards.
pub async fn migrate_legacy_cards(
    repo: &Repository,
    projects: &mut [Project],
    clock: &dyn Clock,
) -> Vec<String> {
    let mut imported = Vec::new();

    for project in projects.iter_mut() {
        let key = legacy_cards_key(&project.name);
        if imported.contains(&key) {
            tracing::warn!(
                "Legacy cards {} already imported; skipping project {}",
                key,
                project.id
            );
            continue;
        }

        let raw = match repo.read_raw(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!("Failed to read legacy cards {}: {}", key, e);
                continue;
            }
        };

        let legacy: Vec<LegacyCard> = match serde_json::from_str(&raw) {
            Ok(cards) => cards,
            Err(e) => {
                tracing::warn!("Skipping unreadable legacy cards {}: {}", key, e);
                continue;
            }
        };

        let count = legacy.len();
        for card in legacy {
            let id = next_id(clock, project.cards.iter().map(|c| c.id.as_str()));
            let content = convert(card, clock);
            project.insert_card(id, content);
        }

        tracing::info!(
            "Migrated {} legacy card(s) into project {} ({})",
            count,
            project.name,
            project.id
        );
        imported.push(key);
    }

    imported
}

fn convert(card: LegacyCard, clock: &dyn Clock) -> CardContent {
    match card {
        LegacyCard::Todo { todos } => {
            let mut todo = TodoCard::default();
            for item in todos {
                let id = next_id(clock, todo.tasks.iter().map(|t| t.id.as_str()));
                todo.tasks.push(TodoItem {
                    id,
                    text: item.text,
                    completed: item.completed,
                });
            }
            CardContent::Todo(todo)
        }
        LegacyCard::Note { text } => {
            CardContent::note(text.unwrap_or_default(), NoteFormatting::default())
        }
        LegacyCard::Finance { deposited_values } => {
            let mut financial = FinancialCard::default();
            let date = clock.now().with_timezone(&Utc);
            for deposit in deposited_values {
                let Some(amount) = deposit.value.value() else {
                    tracing::warn!("Dropping legacy deposit {} with unreadable value", deposit.name);
                    continue;
                };
                let id = next_id(
                    clock,
                    financial.data.transactions.iter().map(|t| t.id.as_str()),
                );
                if let Err(e) = financial.data.add_transaction(id, deposit.name, amount, date) {
                    tracing::warn!("Dropping legacy deposit: {}", e);
                }
            }
            CardContent::Financial(financial)
        }
    }
}
