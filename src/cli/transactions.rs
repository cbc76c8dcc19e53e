use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{parse_date_opt, Context};
use crate::backend::transactions::{get_transaction, list_transactions, set_category as store_category, TransactionFilter};
use crate::categorizer::{quick_rule as make_quick_rule, suggest_rule_text};
use crate::error::{validation, Result};
use crate::models::Transaction;

fn amount_cell(ctx: &Context, cents: i64) -> Cell {
    if cents < 0 {
        Cell::new(ctx.money(cents.abs()).red())
    } else {
        Cell::new(ctx.money(cents).green())
    }
}

fn category_cell(txn: &Transaction) -> Cell {
    match (&txn.category, txn.confidence) {
        (Some(cat), _) if txn.needs_review => Cell::new(format!("{cat} (review)").yellow()),
        (Some(cat), Some(conf)) => Cell::new(format!("{cat} ({conf}%)")),
        (Some(cat), None) => Cell::new(cat),
        (None, _) => Cell::new("Uncategorized".dimmed()),
    }
}

/// Row offset of 1-based `page` with `limit` rows per page.
fn page_offset(page: usize, limit: usize) -> Result<usize> {
    if limit == 0 || page == 0 {
        return Err(validation("--limit and --page must be at least 1"));
    }
    (page - 1)
        .checked_mul(limit)
        .filter(|&offset| i64::try_from(offset).is_ok())
        .ok_or_else(|| validation("--page is too large"))
}

pub fn list(
    search: Option<String>,
    from_date: Option<&str>,
    to_date: Option<&str>,
    uncategorized: bool,
    limit: usize,
    page: usize,
) -> Result<()> {
    let offset = page_offset(page, limit)?;
    let ctx = super::open()?;
    let filter = TransactionFilter {
        search,
        from: parse_date_opt(from_date)?,
        to: parse_date_opt(to_date)?,
        uncategorized_only: uncategorized,
        limit,
        offset,
    };
    let txns = list_transactions(&ctx.conn, &ctx.session, &filter)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Category", "Account"]);
    for txn in &txns {
        table.add_row(vec![
            Cell::new(txn.id),
            Cell::new(txn.posted_at),
            Cell::new(&txn.description),
            amount_cell(&ctx, txn.amount_cents),
            category_cell(txn),
            Cell::new(&txn.account_name),
        ]);
    }
    println!("Transactions (page {page})\n{table}");
    if txns.is_empty() {
        println!("No transactions found.");
    }
    Ok(())
}

pub fn set_category(id: i64, category: &str) -> Result<()> {
    let ctx = super::open()?;
    let txn = store_category(&ctx.conn, &ctx.session, id, category)?;
    println!(
        "{} \u{2192} {}",
        txn.description,
        txn.category.as_deref().unwrap_or_default()
    );
    Ok(())
}

pub fn quick_rule(id: i64, category: &str, text: Option<&str>, confidence: i64) -> Result<()> {
    let ctx = super::open()?;
    let rule_text = match text {
        Some(t) => t.to_string(),
        None => suggest_rule_text(&get_transaction(&ctx.conn, &ctx.session, id)?.description),
    };
    let outcome = make_quick_rule(&ctx.conn, &ctx.session, id, &rule_text, category, confidence)?;
    println!(
        "Added rule {}: '{}' \u{2192} {} ({}%)",
        outcome.rule.id, outcome.rule.matcher, outcome.rule.category, outcome.rule.confidence
    );
    println!(
        "{} \u{2192} {}",
        outcome.transaction.description,
        outcome.transaction.category.as_deref().unwrap_or_default()
    );
    Ok(())
}
