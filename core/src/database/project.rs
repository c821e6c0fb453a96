//! Project and card models
//!
//! A project owns an ordered list of heterogeneous cards. Card `order`
//! values are kept dense and zero-based: every insert, delete or move
//! renumbers the whole list so `order` always equals the display position.
//! Financial cards derive their balance from their transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{DEFAULT_FINANCIAL_TITLE, DEFAULT_TODO_CARD_TITLE};
use crate::error::{AppError, Result};

/// A project board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, deserialize_with = "deserialize_cards")]
    pub cards: Vec<Card>,
}

/// A typed unit of content inside a project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub id: String,
    pub order: usize,
    #[serde(flatten)]
    pub content: CardContent,
}

/// Card payload, discriminated by the `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CardContent {
    Todo(TodoCard),
    Note(NoteCard),
    Image(ImageCard),
    Financial(FinancialCard),
}

impl CardContent {
    pub fn kind(&self) -> &'static str {
        match self {
            CardContent::Todo(_) => "todo",
            CardContent::Note(_) => "note",
            CardContent::Image(_) => "image",
            CardContent::Financial(_) => "financial",
        }
    }

    /// An empty todo card
    pub fn todo() -> Self {
        CardContent::Todo(TodoCard::default())
    }

    pub fn note(content: impl Into<String>, formatting: NoteFormatting) -> Self {
        CardContent::Note(NoteCard {
            content: content.into(),
            formatting,
        })
    }

    pub fn image(image_uri: impl Into<String>, caption: impl Into<String>) -> Self {
        CardContent::Image(ImageCard {
            image_uri: image_uri.into(),
            caption: caption.into(),
        })
    }

    /// An empty ledger
    pub fn financial() -> Self {
        CardContent::Financial(FinancialCard::default())
    }
}

/// A checklist card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoCard {
    #[serde(default = "default_todo_title")]
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<TodoItem>,
}

impl Default for TodoCard {
    fn default() -> Self {
        Self {
            title: default_todo_title(),
            tasks: Vec::new(),
        }
    }
}

impl TodoCard {
    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut TodoItem> {
        self.tasks.iter_mut().find(|t| t.id == item_id)
    }

    pub fn remove_item(&mut self, item_id: &str) -> Option<TodoItem> {
        let index = self.tasks.iter().position(|t| t.id == item_id)?;
        Some(self.tasks.remove(index))
    }
}

/// One line of a todo card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// A free-text note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteCard {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub formatting: NoteFormatting,
}

/// Style flags applied to a whole note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoteFormatting {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStyle {
    Bold,
    Italic,
    List,
}

impl NoteFormatting {
    pub fn toggle(&mut self, style: FormatStyle) {
        match style {
            FormatStyle::Bold => self.bold = !self.bold,
            FormatStyle::Italic => self.italic = !self.italic,
            FormatStyle::List => self.list = !self.list,
        }
    }
}

/// A picture with an optional caption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCard {
    pub image_uri: String,
    #[serde(default)]
    pub caption: String,
}

/// A ledger card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialCard {
    #[serde(default = "default_financial_title")]
    pub title: String,
    #[serde(default)]
    pub data: FinancialData,
}

impl Default for FinancialCard {
    fn default() -> Self {
        Self {
            title: default_financial_title(),
            data: FinancialData::default(),
        }
    }
}

/// Running ledger of signed transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialData {
    #[serde(default = "default_financial_title")]
    pub title: String,
    /// Always the sum of `transactions[].amount`; recomputed on load
    #[serde(default, deserialize_with = "deserialize_balance")]
    pub balance: f64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Default for FinancialData {
    fn default() -> Self {
        Self {
            title: default_financial_title(),
            balance: 0.0,
            transactions: Vec::new(),
        }
    }
}

/// Income is positive, expenses and debts are negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
}

impl FinancialData {
    /// Record an already-signed amount and recompute the balance.
    ///
    /// Fails without touching the ledger when the resulting balance would
    /// not be a finite number.
    pub fn add_transaction(
        &mut self,
        id: String,
        description: String,
        signed_amount: f64,
        date: DateTime<Utc>,
    ) -> Result<&Transaction> {
        let amounts = self.transactions.iter().map(|t| t.amount);
        check_balance(amounts.chain(std::iter::once(signed_amount)).sum())?;

        self.transactions.push(Transaction {
            id,
            description,
            amount: signed_amount,
            date,
        });
        self.recompute_balance();
        Ok(&self.transactions[self.transactions.len() - 1])
    }

    pub fn remove_transaction(&mut self, transaction_id: &str) -> Result<Transaction> {
        let index = self
            .transactions
            .iter()
            .position(|t| t.id == transaction_id)
            .ok_or_else(|| AppError::not_found("Transaction", transaction_id))?;

        let remaining = self
            .transactions
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, t)| t.amount);
        check_balance(remaining.sum())?;

        let removed = self.transactions.remove(index);
        self.recompute_balance();
        Ok(removed)
    }

    /// Whether the transactions add up to a finite balance
    pub fn validate(&self) -> Result<()> {
        check_balance(self.transactions.iter().map(|t| t.amount).sum())
    }

    /// Derive the balance from the transactions, discarding any cached value
    pub fn recompute_balance(&mut self) {
        self.balance = self.transactions.iter().map(|t| t.amount).sum();
    }

    pub fn display_balance(&self) -> BalanceDisplay {
        BalanceDisplay::new(self.balance)
    }
}

/// Balance rendered as an absolute value plus a sign indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDisplay {
    pub negative: bool,
    /// Absolute value with two decimals, e.g. "600.00"
    pub amount: String,
}

impl BalanceDisplay {
    pub fn new(balance: f64) -> Self {
        Self {
            negative: balance < 0.0,
            amount: format!("{:.2}", balance.abs()),
        }
    }
}

impl std::fmt::Display for BalanceDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.negative { "-" } else { "+" };
        write!(f, "{}{}", sign, self.amount)
    }
}

fn check_balance(balance: f64) -> Result<()> {
    if !balance.is_finite() {
        return Err(AppError::validation("Amount is too large for this ledger"));
    }
    Ok(())
}

impl Project {
    pub fn new(id: String, name: String, color: String) -> Self {
        Self {
            id,
            name,
            color,
            cards: Vec::new(),
        }
    }

    /// Cards in display order
    pub fn sorted_cards(&self) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self.cards.iter().collect();
        cards.sort_by_key(|c| c.order);
        cards
    }

    /// Sort by stored order (ties keep their current position) and
    /// renumber to 0..n-1.
    pub fn normalize_order(&mut self) {
        self.cards.sort_by_key(|c| c.order);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (index, card) in self.cards.iter_mut().enumerate() {
            card.order = index;
        }
    }

    /// Whether the orders are exactly {0, 1, ..., n-1}
    pub fn has_dense_order(&self) -> bool {
        let mut orders: Vec<usize> = self.cards.iter().map(|c| c.order).collect();
        orders.sort_unstable();
        orders.iter().enumerate().all(|(i, order)| i == *order)
    }

    /// Append a card at the end of the display sequence
    pub fn insert_card(&mut self, id: String, content: CardContent) -> &Card {
        self.normalize_order();
        let order = self.cards.len();
        self.cards.push(Card { id, order, content });
        &self.cards[order]
    }

    /// Swap the card at display `index` with the one above it.
    /// Returns false when `index` is the first card or out of range.
    pub fn move_card_up(&mut self, index: usize) -> bool {
        self.normalize_order();
        if index == 0 || index >= self.cards.len() {
            return false;
        }
        self.cards.swap(index, index - 1);
        self.renumber();
        true
    }

    /// Swap the card at display `index` with the one below it.
    /// Returns false when `index` is the last card or out of range.
    pub fn move_card_down(&mut self, index: usize) -> bool {
        self.normalize_order();
        if index + 1 >= self.cards.len() {
            return false;
        }
        self.cards.swap(index, index + 1);
        self.renumber();
        true
    }

    /// Remove a card and close the gap it leaves
    pub fn delete_card(&mut self, card_id: &str) -> Option<Card> {
        self.normalize_order();
        let index = self.cards.iter().position(|c| c.id == card_id)?;
        let removed = self.cards.remove(index);
        self.renumber();
        Some(removed)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn card_mut(&mut self, card_id: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == card_id)
    }
}

fn default_todo_title() -> String {
    DEFAULT_TODO_CARD_TITLE.to_string()
}

fn default_financial_title() -> String {
    DEFAULT_FINANCIAL_TITLE.to_string()
}

/// A non-finite balance is written as `null`; the value is recomputed anyway
fn deserialize_balance<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Card as found in storage; `order` may be missing on old records
#[derive(Deserialize)]
struct StoredCard {
    id: String,
    #[serde(default)]
    order: Option<usize>,
    #[serde(flatten)]
    content: CardContent,
}

/// Load cards leniently: unreadable cards are dropped with a warning,
/// a missing `order` falls back to the card's position, and ledger
/// balances are recomputed from their transactions.
fn deserialize_cards<'de, D>(deserializer: D) -> std::result::Result<Vec<Card>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;

    let cards = raw
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<StoredCard>(value) {
            Ok(stored) => {
                let mut content = stored.content;
                if let CardContent::Financial(financial) = &mut content {
                    financial.data.recompute_balance();
                }
                Some(Card {
                    id: stored.id,
                    order: stored.order.unwrap_or(index),
                    content,
                })
            }
            Err(e) => {
                tracing::warn!("Dropping unreadable card at position {}: {}", index, e);
                None
            }
        })
        .collect();

    Ok(cards)
}
