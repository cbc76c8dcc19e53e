use regex::Regex;
use rusqlite::Connection;

use crate::backend::rules::{create_rule, list_rules};
use crate::backend::transactions::{get_transaction, list_needing_category, write_category};
use crate::error::{validation, Result};
use crate::matcher::RuleSet;
use crate::models::{Rule, Transaction};
use crate::session::Session;

/// Confidence offered when a rule is made straight from a transaction.
pub const QUICK_RULE_CONFIDENCE: i64 = 80;

pub struct CategorizeResult {
    pub categorized: usize,
    pub still_uncategorized: usize,
}

/// Run the owner's rules over every uncategorized or flagged transaction.
pub fn apply_rules(conn: &Connection, session: &Session) -> Result<CategorizeResult> {
    let rules = list_rules(conn, session)?;
    let rule_set = RuleSet::new(&rules);
    let pending = list_needing_category(conn, session)?;
    if rule_set.is_empty() {
        return Ok(CategorizeResult {
            categorized: 0,
            still_uncategorized: pending.len(),
        });
    }

    let mut categorized = 0usize;
    let mut still_uncategorized = 0usize;

    let tx = conn.unchecked_transaction()?;
    for txn in &pending {
        match rule_set.best_match(&txn.description) {
            Some(m) => {
                write_category(&tx, session, txn.id, &m.category, Some(m.confidence))?;
                tracing::debug!(txn = txn.id, rule = m.rule_id, category = %m.category, "rule matched");
                categorized += 1;
            }
            None => still_uncategorized += 1,
        }
    }
    tx.commit()?;

    tracing::info!(
        owner = %session.user_id,
        rules = rule_set.len(),
        categorized,
        still_uncategorized,
        "applied rules"
    );
    Ok(CategorizeResult {
        categorized,
        still_uncategorized,
    })
}

/// Default rule text for a description: its leading merchant-looking run
/// of letters, digits, spaces and `&'-`.
pub fn suggest_rule_text(description: &str) -> String {
    let desc = description.trim();
    match Regex::new(r"^([A-Za-z0-9\s&'-]+)") {
        Ok(re) => re
            .captures(desc)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| desc.to_string()),
        Err(_) => desc.to_string(),
    }
}

pub struct QuickRuleOutcome {
    pub rule: Rule,
    pub transaction: Transaction,
}

/// Create a `%text%` rule from a transaction and categorize that
/// transaction with it. Either both writes land or neither does.
pub fn quick_rule(
    conn: &Connection,
    session: &Session,
    transaction_id: i64,
    rule_text: &str,
    category: &str,
    confidence: i64,
) -> Result<QuickRuleOutcome> {
    let text = rule_text.trim();
    if text.is_empty() {
        return Err(validation("rule text is required"));
    }
    if category.trim().is_empty() {
        return Err(validation("select a category for the rule"));
    }

    let tx = conn.unchecked_transaction()?;
    let rule = create_rule(&tx, session, &format!("%{text}%"), category, confidence)?;
    write_category(&tx, session, transaction_id, &rule.category, Some(rule.confidence))?;
    tx.commit()?;

    tracing::info!(owner = %session.user_id, rule = rule.id, txn = transaction_id, "quick rule applied");
    Ok(QuickRuleOutcome {
        rule,
        transaction: get_transaction(conn, session, transaction_id)?,
    })
}
