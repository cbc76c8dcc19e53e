use rusqlite::Connection;

use crate::error::Result;
use crate::models::Account;
use crate::session::Session;

pub fn list_accounts(conn: &Connection, session: &Session) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner, name, account_type FROM accounts WHERE owner = ?1 ORDER BY name",
    )?;
    let rows = stmt
        .query_map([&session.user_id], |row| {
            Ok(Account {
                id: row.get(0)?,
                owner: row.get(1)?,
                name: row.get(2)?,
                account_type: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    tracing::debug!(owner = %session.user_id, count = rows.len(), "listed accounts");
    Ok(rows)
}

/// Accounts normally arrive through the bank feed; this is for seeding.
pub fn insert_account(
    conn: &Connection,
    session: &Session,
    name: &str,
    account_type: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts (owner, name, account_type) VALUES (?1, ?2, ?3)",
        rusqlite::params![session.user_id, name, account_type],
    )?;
    Ok(conn.last_insert_rowid())
}
