use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::{Connection, Row};

use super::budgets::refresh_category_spend;
use super::categories::require_category;
use super::{expect_affected, not_found};
use crate::error::{validation, Result};
use crate::models::Transaction;
use crate::session::Session;

pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct TransactionFilter {
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Only rows without a category or flagged for review.
    pub uncategorized_only: bool,
    pub limit: usize,
    pub offset: usize,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            search: None,
            from: None,
            to: None,
            uncategorized_only: false,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

const SELECT_TXN: &str = "SELECT t.id, t.account_id, a.name, t.posted_at, t.amount_cents, t.description, \
     t.category, t.confidence, t.needs_review \
     FROM transactions t JOIN accounts a ON t.account_id = a.id";

fn txn_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    let confidence: Option<i64> = row.get(7)?;
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        account_name: row.get(2)?,
        posted_at: row.get(3)?,
        amount_cents: row.get(4)?,
        description: row.get(5)?,
        category: row.get(6)?,
        confidence: confidence.map(|c| c.clamp(0, 100) as u8),
        needs_review: row.get(8)?,
    })
}

/// Newest first, one page at a time.
pub fn list_transactions(
    conn: &Connection,
    session: &Session,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(validation(format!("--from {from} is after --to {to}")));
        }
    }

    let mut clauses = vec!["a.owner = ?".to_string()];
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(session.user_id.clone())];

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        clauses.push("instr(lower(t.description), lower(?)) > 0".to_string());
        params.push(Box::new(search.trim().to_string()));
    }
    if let Some(from) = filter.from {
        clauses.push("t.posted_at >= ?".to_string());
        params.push(Box::new(from));
    }
    if let Some(to) = filter.to {
        clauses.push("t.posted_at <= ?".to_string());
        params.push(Box::new(to));
    }
    if filter.uncategorized_only {
        clauses.push("(t.category IS NULL OR t.needs_review = 1)".to_string());
    }

    let sql = format!(
        "{SELECT_TXN} WHERE {} ORDER BY t.posted_at DESC, t.id DESC LIMIT ? OFFSET ?",
        clauses.join(" AND ")
    );
    params.push(Box::new(filter.limit as i64));
    params.push(Box::new(filter.offset as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            txn_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    tracing::debug!(owner = %session.user_id, count = rows.len(), "listed transactions");
    Ok(rows)
}

/// Every uncategorized or flagged transaction of the owner, oldest first.
pub fn list_needing_category(conn: &Connection, session: &Session) -> Result<Vec<Transaction>> {
    let sql = format!(
        "{SELECT_TXN} WHERE a.owner = ?1 AND (t.category IS NULL OR t.needs_review = 1) \
         ORDER BY t.posted_at, t.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([&session.user_id], txn_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_transaction(conn: &Connection, session: &Session, id: i64) -> Result<Transaction> {
    let sql = format!("{SELECT_TXN} WHERE t.id = ?1 AND a.owner = ?2");
    conn.query_row(&sql, rusqlite::params![id, session.user_id], txn_from_row)
        .map_err(not_found("transaction", id))
}

/// Write a category onto a transaction and clear its review flag.
/// `confidence` is `None` for a manual choice. Spend of the budgets tracking
/// the old and the new category is recomputed on the same connection, so a
/// caller's transaction covers both.
pub(crate) fn write_category(
    conn: &Connection,
    session: &Session,
    id: i64,
    category: &str,
    confidence: Option<u8>,
) -> Result<()> {
    let previous: Option<String> = conn
        .query_row(
            "SELECT t.category FROM transactions t JOIN accounts a ON t.account_id = a.id \
             WHERE t.id = ?1 AND a.owner = ?2",
            rusqlite::params![id, session.user_id],
            |row| row.get(0),
        )
        .map_err(not_found("transaction", id))?;

    let affected = conn.execute(
        "UPDATE transactions SET category = ?1, confidence = ?2, needs_review = 0, \
         updated_at = datetime('now') \
         WHERE id = ?3 AND account_id IN (SELECT id FROM accounts WHERE owner = ?4)",
        rusqlite::params![category, confidence, id, session.user_id],
    )?;
    expect_affected(affected, "transaction", id)?;

    refresh_category_spend(conn, session, category)?;
    if let Some(prev) = previous.filter(|p| p != category) {
        refresh_category_spend(conn, session, &prev)?;
    }
    Ok(())
}

/// Manual categorization from the transaction list.
pub fn set_category(conn: &Connection, session: &Session, id: i64, category: &str) -> Result<Transaction> {
    let category = require_category(conn, session, category)?;
    let tx = conn.unchecked_transaction()?;
    write_category(&tx, session, id, &category.name, None)?;
    tx.commit()?;
    tracing::info!(owner = %session.user_id, id, category = %category.name, "categorized transaction");
    get_transaction(conn, session, id)
}

/// Transactions normally arrive through the bank feed; this is for seeding.
pub fn insert_transaction(
    conn: &Connection,
    session: &Session,
    account_id: i64,
    posted_at: NaiveDate,
    amount_cents: i64,
    description: &str,
) -> Result<i64> {
    let owned: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?1 AND owner = ?2)",
        rusqlite::params![account_id, session.user_id],
        |row| row.get(0),
    )?;
    if !owned {
        return Err(crate::error::PocketbookError::NotFound {
            kind: "account",
            id: account_id,
        });
    }
    conn.execute(
        "INSERT INTO transactions (account_id, posted_at, amount_cents, description) \
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![account_id, posted_at, amount_cents, description],
    )?;
    Ok(conn.last_insert_rowid())
}
