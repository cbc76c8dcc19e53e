use chrono::NaiveDate;

use crate::periods::Recurrence;

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub account_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: i64,
    /// `%`-wildcard pattern, see [`crate::matcher::Pattern`].
    pub matcher: String,
    /// Category name; a soft reference.
    pub category: String,
    pub confidence: u8,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub account_name: String,
    pub posted_at: NaiveDate,
    /// Negative values are expenses.
    pub amount_cents: i64,
    pub description: String,
    pub category: Option<String>,
    pub confidence: Option<u8>,
    pub needs_review: bool,
}

#[derive(Debug, Clone)]
pub struct Budget {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub name: String,
    pub amount_cents: i64,
    pub start_date: NaiveDate,
    pub recurrence: Recurrence,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetPeriod {
    pub id: i64,
    pub budget_id: i64,
    pub period_start: NaiveDate,
    /// Inclusive.
    pub period_end: NaiveDate,
    pub budgeted_amount_cents: i64,
    pub spent_amount_cents: i64,
}
