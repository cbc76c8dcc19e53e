use rusqlite::{Connection, OptionalExtension, Row};

use super::{expect_affected, not_found};
use crate::error::{validation, PocketbookError, Result};
use crate::models::Category;
use crate::session::Session;

/// Display colors a category may carry.
pub const PALETTE: &[&str] = &[
    "red", "orange", "yellow", "green", "blue", "indigo", "purple", "pink", "gray", "cyan",
];

/// Color used for spending that has no (known) category.
pub const FALLBACK_COLOR: &str = "gray";

fn check_color(color: &str) -> Result<()> {
    if PALETTE.contains(&color) {
        Ok(())
    } else {
        Err(validation(format!(
            "unknown color '{color}' (choose one of: {})",
            PALETTE.join(", ")
        )))
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(validation("category name is required"));
    }
    Ok(())
}

fn name_taken(conn: &Connection, session: &Session, name: &str, except_id: Option<i64>) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE owner = ?1 AND name = ?2 AND id != ?3)",
        rusqlite::params![session.user_id, name, except_id.unwrap_or(-1)],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
    })
}

pub fn list_categories(conn: &Connection, session: &Session) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner, name, color FROM categories WHERE owner = ?1 ORDER BY name",
    )?;
    let rows = stmt
        .query_map([&session.user_id], category_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_category(conn: &Connection, session: &Session, id: i64) -> Result<Category> {
    conn.query_row(
        "SELECT id, owner, name, color FROM categories WHERE id = ?1 AND owner = ?2",
        rusqlite::params![id, session.user_id],
        category_from_row,
    )
    .map_err(not_found("category", id))
}

pub fn find_category_by_name(conn: &Connection, session: &Session, name: &str) -> Result<Option<Category>> {
    let found = conn
        .query_row(
            "SELECT id, owner, name, color FROM categories WHERE owner = ?1 AND name = ?2",
            rusqlite::params![session.user_id, name],
            category_from_row,
        )
        .optional()?;
    Ok(found)
}

/// Like [`find_category_by_name`] but a missing category is an error.
pub fn require_category(conn: &Connection, session: &Session, name: &str) -> Result<Category> {
    find_category_by_name(conn, session, name)?
        .ok_or_else(|| PocketbookError::UnknownCategory(name.to_string()))
}

pub fn create_category(conn: &Connection, session: &Session, name: &str, color: &str) -> Result<Category> {
    let name = name.trim();
    check_name(name)?;
    check_color(color)?;
    if name_taken(conn, session, name, None)? {
        return Err(validation(format!("category name already exists: {name}")));
    }
    conn.execute(
        "INSERT INTO categories (owner, name, color) VALUES (?1, ?2, ?3)",
        rusqlite::params![session.user_id, name, color],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(owner = %session.user_id, id, name, "created category");
    Ok(Category {
        id,
        owner: session.user_id.clone(),
        name: name.to_string(),
        color: color.to_string(),
    })
}

/// Renaming carries the new name over to the owner's rules and transactions,
/// which refer to categories by name.
pub fn update_category(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    name: Option<&str>,
    color: Option<&str>,
) -> Result<Category> {
    let current = get_category(conn, session, id)?;
    let new_name = match name.map(str::trim) {
        Some(n) => {
            check_name(n)?;
            if name_taken(conn, session, n, Some(id))? {
                return Err(validation(format!("category name already exists: {n}")));
            }
            n.to_string()
        }
        None => current.name.clone(),
    };
    let new_color = match color {
        Some(c) => {
            check_color(c)?;
            c.to_string()
        }
        None => current.color.clone(),
    };

    let tx = conn.transaction()?;
    let affected = tx.execute(
        "UPDATE categories SET name = ?1, color = ?2, updated_at = datetime('now') \
         WHERE id = ?3 AND owner = ?4",
        rusqlite::params![new_name, new_color, id, session.user_id],
    )?;
    expect_affected(affected, "category", id)?;
    if new_name != current.name {
        tx.execute(
            "UPDATE rules SET category = ?1, updated_at = datetime('now') \
             WHERE owner = ?2 AND category = ?3",
            rusqlite::params![new_name, session.user_id, current.name],
        )?;
        tx.execute(
            "UPDATE transactions SET category = ?1, updated_at = datetime('now') \
             WHERE category = ?2 AND account_id IN (SELECT id FROM accounts WHERE owner = ?3)",
            rusqlite::params![new_name, current.name, session.user_id],
        )?;
    }
    tx.commit()?;
    tracing::info!(owner = %session.user_id, id, name = %new_name, "updated category");

    Ok(Category {
        name: new_name,
        color: new_color,
        ..current
    })
}

/// Refused while a budget still tracks the category.
pub fn delete_category(conn: &Connection, session: &Session, id: i64) -> Result<()> {
    let budgets: i64 = conn.query_row(
        "SELECT count(*) FROM budgets WHERE category_id = ?1 AND owner = ?2",
        rusqlite::params![id, session.user_id],
        |row| row.get(0),
    )?;
    if budgets > 0 {
        return Err(validation(format!(
            "category {id} is used by {budgets} budget(s); delete those first"
        )));
    }
    let affected = conn.execute(
        "DELETE FROM categories WHERE id = ?1 AND owner = ?2",
        rusqlite::params![id, session.user_id],
    )?;
    expect_affected(affected, "category", id)?;
    tracing::info!(owner = %session.user_id, id, "deleted category");
    Ok(())
}
