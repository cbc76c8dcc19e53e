use rusqlite::{Connection, Row};

use super::categories::require_category;
use super::{expect_affected, not_found};
use crate::error::{validation, Result};
use crate::models::Rule;
use crate::session::Session;

/// Confidence given to rules created from the rules list.
pub const DEFAULT_CONFIDENCE: i64 = 50;

pub(crate) fn check_confidence(confidence: i64) -> Result<u8> {
    u8::try_from(confidence)
        .ok()
        .filter(|c| *c <= 100)
        .ok_or_else(|| validation(format!("confidence must be between 0 and 100, got {confidence}")))
}

fn check_matcher(matcher: &str) -> Result<()> {
    if matcher.trim().is_empty() {
        return Err(validation("rule pattern is required"));
    }
    Ok(())
}

fn rule_from_row(row: &Row) -> rusqlite::Result<Rule> {
    let confidence: i64 = row.get(3)?;
    Ok(Rule {
        id: row.get(0)?,
        matcher: row.get(1)?,
        category: row.get(2)?,
        confidence: confidence.clamp(0, 100) as u8,
    })
}

/// Newest first; this is also the order ties are broken in.
pub fn list_rules(conn: &Connection, session: &Session) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(
        "SELECT id, matcher, category, confidence FROM rules \
         WHERE owner = ?1 ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt
        .query_map([&session.user_id], rule_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_rule(conn: &Connection, session: &Session, id: i64) -> Result<Rule> {
    conn.query_row(
        "SELECT id, matcher, category, confidence FROM rules WHERE id = ?1 AND owner = ?2",
        rusqlite::params![id, session.user_id],
        rule_from_row,
    )
    .map_err(not_found("rule", id))
}

pub fn create_rule(
    conn: &Connection,
    session: &Session,
    matcher: &str,
    category: &str,
    confidence: i64,
) -> Result<Rule> {
    check_matcher(matcher)?;
    let confidence = check_confidence(confidence)?;
    let category = require_category(conn, session, category)?;

    conn.execute(
        "INSERT INTO rules (owner, matcher, category, confidence) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![session.user_id, matcher, category.name, confidence],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(owner = %session.user_id, id, matcher, category = %category.name, "created rule");
    Ok(Rule {
        id,
        matcher: matcher.to_string(),
        category: category.name,
        confidence,
    })
}

pub fn update_rule(
    conn: &Connection,
    session: &Session,
    id: i64,
    matcher: Option<&str>,
    category: Option<&str>,
    confidence: Option<i64>,
) -> Result<Rule> {
    let current = get_rule(conn, session, id)?;
    if let Some(m) = matcher {
        check_matcher(m)?;
    }
    let confidence = match confidence {
        Some(c) => check_confidence(c)?,
        None => current.confidence,
    };
    let category = match category {
        Some(name) => require_category(conn, session, name)?.name,
        None => current.category.clone(),
    };
    let matcher = matcher.map_or(current.matcher.clone(), str::to_string);

    let affected = conn.execute(
        "UPDATE rules SET matcher = ?1, category = ?2, confidence = ?3, updated_at = datetime('now') \
         WHERE id = ?4 AND owner = ?5",
        rusqlite::params![matcher, category, confidence, id, session.user_id],
    )?;
    expect_affected(affected, "rule", id)?;
    tracing::info!(owner = %session.user_id, id, "updated rule");
    Ok(Rule {
        id,
        matcher,
        category,
        confidence,
    })
}

pub fn delete_rule(conn: &Connection, session: &Session, id: i64) -> Result<()> {
    let affected = conn.execute(
        "DELETE FROM rules WHERE id = ?1 AND owner = ?2",
        rusqlite::params![id, session.user_id],
    )?;
    expect_affected(affected, "rule", id)?;
    tracing::info!(owner = %session.user_id, id, "deleted rule");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::categories::create_category;
    use crate::db::test_db;
    use crate::error::PocketbookError;

    fn setup() -> (tempfile::TempDir, Connection, Session) {
        let (dir, conn) = test_db();
        let s = Session::new("alice");
        create_category(&conn, &s, "Transport", "blue").unwrap();
        create_category(&conn, &s, "Dining", "orange").unwrap();
        (dir, conn, s)
    }

    #[test]
    fn test_create_rule_requires_known_category() {
        let (_dir, conn, s) = setup();
        assert!(matches!(
            create_rule(&conn, &s, "%UBER%", "Nope", 50),
            Err(PocketbookError::UnknownCategory(_))
        ));
        let rule = create_rule(&conn, &s, "%UBER%", "Transport", 50).unwrap();
        assert_eq!(rule.category, "Transport");
        assert_eq!(rule.confidence, 50);
    }

    #[test]
    fn test_confidence_bounds() {
        let (_dir, conn, s) = setup();
        assert!(create_rule(&conn, &s, "%UBER%", "Transport", 101).is_err());
        assert!(create_rule(&conn, &s, "%UBER%", "Transport", -1).is_err());
        assert!(create_rule(&conn, &s, "%UBER%", "Transport", 0).is_ok());
        assert!(create_rule(&conn, &s, "%UBER%", "Transport", 100).is_ok());
    }

    #[test]
    fn test_blank_pattern_rejected() {
        let (_dir, conn, s) = setup();
        assert!(create_rule(&conn, &s, " ", "Transport", 50).is_err());
    }

    #[test]
    fn test_list_newest_first() {
        let (_dir, conn, s) = setup();
        create_rule(&conn, &s, "%UBER%", "Transport", 50).unwrap();
        create_rule(&conn, &s, "%UBER EATS%", "Dining", 90).unwrap();
        let rules = list_rules(&conn, &s).unwrap();
        assert_eq!(rules[0].matcher, "%UBER EATS%");
        assert_eq!(rules[1].matcher, "%UBER%");
    }

    #[test]
    fn test_update_and_delete() {
        let (_dir, conn, s) = setup();
        let rule = create_rule(&conn, &s, "%UBER%", "Transport", 50).unwrap();
        let updated = update_rule(&conn, &s, rule.id, None, Some("Dining"), Some(75)).unwrap();
        assert_eq!(updated.matcher, "%UBER%");
        assert_eq!(updated.category, "Dining");
        assert_eq!(updated.confidence, 75);
        assert_eq!(get_rule(&conn, &s, rule.id).unwrap(), updated);

        assert!(delete_rule(&conn, &Session::new("bob"), rule.id).is_err());
        delete_rule(&conn, &s, rule.id).unwrap();
        assert!(list_rules(&conn, &s).unwrap().is_empty());
    }
}
