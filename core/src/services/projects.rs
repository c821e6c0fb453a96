//! Projects service
//!
//! Project boards and the cards inside them. Every card operation rewrites
//! the owning project, and through it the whole projects collection.

use super::collection::EntityCollection;
use super::ledger::{parse_amount, parse_entry, EntryKind};
use crate::clock::{next_id, SharedClock};
use crate::config::{is_palette_color, DEFAULT_PROJECT_COLOR};
use crate::database::migrations::migrate_legacy_cards;
use crate::database::{
    Card, CardContent, FormatStyle, Project, Repository, TodoItem, Transaction,
};
use crate::error::{require_text, AppError, Result};
use chrono::Utc;

/// Service for managing projects and their cards
#[derive(Clone)]
pub struct ProjectsService {
    projects: EntityCollection<Project>,
    clock: SharedClock,
}

impl ProjectsService {
    /// Load projects and fold in any legacy card lists
    pub async fn load(repo: Repository, clock: SharedClock) -> Self {
        let mut projects: Vec<Project> = repo.load_collection().await;
        for project in projects.iter_mut() {
            project.normalize_order();
        }

        let imported = migrate_legacy_cards(&repo, &mut projects, clock.as_ref()).await;
        let projects = EntityCollection::with_items(repo.clone(), projects);

        if !imported.is_empty() {
            let failures = repo.failed_writes();
            projects.update_all(|_| imported.len()).await;
            repo.flush().await;

            // Legacy lists go only once the imported cards are on disk
            if repo.failed_writes() == failures {
                for key in &imported {
                    repo.remove_record(key);
                }
            } else {
                tracing::warn!("Keeping {} legacy card list(s) after failed write", imported.len());
            }
        }

        Self { projects, clock }
    }

    /// Create a new project; `color` falls back to the default
    pub async fn create_project(&self, name: &str, color: Option<&str>) -> Result<Project> {
        require_text(name, "Project name cannot be empty")?;
        let color = validate_color(color.unwrap_or(DEFAULT_PROJECT_COLOR))?;

        tracing::info!("Creating project: {}", name.trim());

        self.projects
            .insert_with(|existing| {
                let id = next_id(self.clock.as_ref(), existing.iter().map(|p| p.id.as_str()));
                Ok(Project::new(id, name.trim().to_string(), color))
            })
            .await
    }

    /// Rename and/or recolor a project
    pub async fn update_project(
        &self,
        id: &str,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Project> {
        if let Some(name) = name {
            require_text(name, "Project name cannot be empty")?;
        }
        let color = color.map(validate_color).transpose()?;

        self.projects
            .update(id, |project| {
                if let Some(name) = name {
                    project.name = name.trim().to_string();
                }
                if let Some(color) = color {
                    project.color = color;
                }
                Ok(project.clone())
            })
            .await
    }

    /// Delete a project together with its cards
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting project: {}", id);
        let project = self.projects.remove(id).await?;
        tracing::info!(
            "Project {} deleted with {} card(s)",
            project.name,
            project.cards.len()
        );
        Ok(())
    }

    pub async fn get_project(&self, id: &str) -> Result<Project> {
        self.projects.get(id).await
    }

    pub async fn list_projects(&self) -> Vec<Project> {
        self.projects.snapshot().await
    }

    /// Cards of a project in display order
    pub async fn cards(&self, project_id: &str) -> Result<Vec<Card>> {
        let project = self.projects.get(project_id).await?;
        Ok(project.sorted_cards().into_iter().cloned().collect())
    }

    /// Append a card at the end of a project
    pub async fn add_card(&self, project_id: &str, content: CardContent) -> Result<Card> {
        validate_content(&content)?;
        let kind = content.kind();

        let card = self
            .projects
            .update(project_id, |project| {
                let id = next_id(self.clock.as_ref(), project.cards.iter().map(|c| c.id.as_str()));
                Ok(project.insert_card(id, content).clone())
            })
            .await?;

        tracing::info!("Added {} card {} to project {}", kind, card.id, project_id);
        Ok(card)
    }

    /// Replace a card's content, keeping its id and position
    pub async fn update_card(
        &self,
        project_id: &str,
        card_id: &str,
        content: CardContent,
    ) -> Result<Card> {
        validate_content(&content)?;

        self.with_card(project_id, card_id, |card| {
            card.content = content;
            if let CardContent::Financial(financial) = &mut card.content {
                financial.data.recompute_balance();
            }
            Ok(card.clone())
        })
        .await
    }

    pub async fn delete_card(&self, project_id: &str, card_id: &str) -> Result<()> {
        tracing::info!("Deleting card {} from project {}", card_id, project_id);

        self.projects
            .update(project_id, |project| {
                project
                    .delete_card(card_id)
                    .map(|_| ())
                    .ok_or_else(|| card_missing(card_id))
            })
            .await
    }

    /// Move the card at display `index` one slot up. Returns false at the top.
    pub async fn move_card_up(&self, project_id: &str, index: usize) -> Result<bool> {
        self.projects
            .update(project_id, |project| Ok(project.move_card_up(index)))
            .await
    }

    /// Move the card at display `index` one slot down. Returns false at the bottom.
    pub async fn move_card_down(&self, project_id: &str, index: usize) -> Result<bool> {
        self.projects
            .update(project_id, |project| Ok(project.move_card_down(index)))
            .await
    }

    // ===== Todo cards =====

    pub async fn add_todo_item(
        &self,
        project_id: &str,
        card_id: &str,
        text: &str,
    ) -> Result<TodoItem> {
        require_text(text, "Task text cannot be empty")?;
        let clock = self.clock.clone();

        self.with_card(project_id, card_id, |card| {
            let CardContent::Todo(todo) = &mut card.content else {
                return Err(wrong_kind(card, "todo"));
            };
            let item = TodoItem {
                id: next_id(clock.as_ref(), todo.tasks.iter().map(|t| t.id.as_str())),
                text: text.trim().to_string(),
                completed: false,
            };
            todo.tasks.push(item.clone());
            Ok(item)
        })
        .await
    }

    pub async fn edit_todo_item(
        &self,
        project_id: &str,
        card_id: &str,
        item_id: &str,
        text: &str,
    ) -> Result<TodoItem> {
        require_text(text, "Task text cannot be empty")?;

        self.with_todo_item(project_id, card_id, item_id, |item| {
            item.text = text.trim().to_string();
        })
        .await
    }

    pub async fn toggle_todo_item(
        &self,
        project_id: &str,
        card_id: &str,
        item_id: &str,
    ) -> Result<TodoItem> {
        self.with_todo_item(project_id, card_id, item_id, |item| {
            item.completed = !item.completed;
        })
        .await
    }

    pub async fn remove_todo_item(
        &self,
        project_id: &str,
        card_id: &str,
        item_id: &str,
    ) -> Result<()> {
        self.with_card(project_id, card_id, |card| {
            let CardContent::Todo(todo) = &mut card.content else {
                return Err(wrong_kind(card, "todo"));
            };
            todo.remove_item(item_id)
                .map(|_| ())
                .ok_or_else(|| AppError::not_found("Todo item", item_id))
        })
        .await
    }

    // ===== Note cards =====

    pub async fn toggle_note_format(
        &self,
        project_id: &str,
        card_id: &str,
        style: FormatStyle,
    ) -> Result<Card> {
        self.with_card(project_id, card_id, |card| {
            let CardContent::Note(note) = &mut card.content else {
                return Err(wrong_kind(card, "note"));
            };
            note.formatting.toggle(style);
            Ok(card.clone())
        })
        .await
    }

    // ===== Financial cards =====

    /// Record an already-signed amount (income positive, expense negative)
    pub async fn add_transaction(
        &self,
        project_id: &str,
        card_id: &str,
        description: &str,
        raw_amount: &str,
    ) -> Result<Transaction> {
        let (description, amount) = parse_entry(description, raw_amount)?;
        self.record_transaction(project_id, card_id, description, amount)
            .await
    }

    /// Record an income or expense whose sign comes from `kind`
    pub async fn add_entry(
        &self,
        project_id: &str,
        card_id: &str,
        description: &str,
        raw_amount: &str,
        kind: EntryKind,
    ) -> Result<Transaction> {
        require_text(description, "Description cannot be empty")?;
        let amount = kind.sign(parse_amount(raw_amount)?);
        self.record_transaction(project_id, card_id, description.trim().to_string(), amount)
            .await
    }

    pub async fn remove_transaction(
        &self,
        project_id: &str,
        card_id: &str,
        transaction_id: &str,
    ) -> Result<()> {
        self.with_card(project_id, card_id, |card| {
            let CardContent::Financial(financial) = &mut card.content else {
                return Err(wrong_kind(card, "financial"));
            };
            financial.data.remove_transaction(transaction_id).map(|_| ())
        })
        .await
    }

    async fn record_transaction(
        &self,
        project_id: &str,
        card_id: &str,
        description: String,
        amount: f64,
    ) -> Result<Transaction> {
        let clock = self.clock.clone();

        let transaction = self
            .with_card(project_id, card_id, |card| {
                let CardContent::Financial(financial) = &mut card.content else {
                    return Err(wrong_kind(card, "financial"));
                };
                let ledger = &mut financial.data;
                let id = next_id(clock.as_ref(), ledger.transactions.iter().map(|t| t.id.as_str()));
                let date = clock.now().with_timezone(&Utc);
                Ok(ledger.add_transaction(id, description, amount, date)?.clone())
            })
            .await?;

        tracing::debug!(
            "Recorded transaction {} ({}) on card {}",
            transaction.id,
            transaction.amount,
            card_id
        );
        Ok(transaction)
    }

    async fn with_card<R, F>(&self, project_id: &str, card_id: &str, edit: F) -> Result<R>
    where
        F: FnOnce(&mut Card) -> Result<R>,
    {
        self.projects
            .update(project_id, |project| {
                let card = project
                    .card_mut(card_id)
                    .ok_or_else(|| card_missing(card_id))?;
                edit(card)
            })
            .await
    }

    async fn with_todo_item<F>(
        &self,
        project_id: &str,
        card_id: &str,
        item_id: &str,
        edit: F,
    ) -> Result<TodoItem>
    where
        F: FnOnce(&mut TodoItem),
    {
        self.with_card(project_id, card_id, |card| {
            let CardContent::Todo(todo) = &mut card.content else {
                return Err(wrong_kind(card, "todo"));
            };
            let item = todo
                .item_mut(item_id)
                .ok_or_else(|| AppError::not_found("Todo item", item_id))?;
            edit(item);
            Ok(item.clone())
        })
        .await
    }
}

fn validate_color(color: &str) -> Result<String> {
    if !is_palette_color(color) {
        return Err(AppError::validation(format!("Unsupported project color: {}", color)));
    }
    Ok(color.to_uppercase())
}

/// Content rules shared by add and edit
fn validate_content(content: &CardContent) -> Result<()> {
    match content {
        CardContent::Note(note) => require_text(&note.content, "Note cannot be empty"),
        CardContent::Image(image) => require_text(&image.image_uri, "Select an image first"),
        CardContent::Todo(todo) => require_text(&todo.title, "Card title cannot be empty"),
        CardContent::Financial(financial) => {
            require_text(&financial.title, "Card title cannot be empty")?;
            financial.data.validate()
        }
    }
}

fn card_missing(card_id: &str) -> AppError {
    tracing::warn!("Card not found: {}", card_id);
    AppError::not_found("Card", card_id)
}

fn wrong_kind(card: &Card, expected: &str) -> AppError {
    AppError::validation(format!(
        "Card {} is a {} card, not a {} card",
        card.id,
        card.content.kind(),
        expected
    ))
}
