//! Ledger input helpers
//!
//! Turns raw user input into signed transaction amounts.

use crate::error::{require_text, AppError, Result};

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Money in, stored positive
    Income,
    /// Expense or debt, stored negative
    Expense,
}

impl EntryKind {
    /// Apply this kind's sign to a magnitude
    pub fn sign(self, amount: f64) -> f64 {
        match self {
            EntryKind::Income => amount.abs(),
            EntryKind::Expense => -amount.abs(),
        }
    }
}

/// Parse a raw amount such as `"1000"`, `"-400"` or `"12,50"`.
///
/// A decimal comma is accepted. Empty, unparsable and non-finite input
/// is rejected.
pub fn parse_amount(raw: &str) -> Result<f64> {
    require_text(raw, "Amount cannot be empty")?;

    let normalized = raw.trim().replace(',', ".");
    let amount: f64 = normalized
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid amount: {}", raw.trim())))?;

    if !amount.is_finite() {
        return Err(AppError::validation(format!(
            "Invalid amount: {}",
            raw.trim()
        )));
    }

    Ok(amount)
}

/// Validate a transaction description and raw amount together
pub fn parse_entry(description: &str, raw_amount: &str) -> Result<(String, f64)> {
    require_text(description, "Description cannot be empty")?;
    let amount = parse_amount(raw_amount)?;
    Ok((description.trim().to_string(), amount))
}
