use comfy_table::{Cell, Table};

use crate::backend::rules::{create_rule, delete_rule, get_rule, list_rules, update_rule};
use crate::error::Result;

pub fn add(matcher: &str, category: &str, confidence: i64) -> Result<()> {
    let ctx = super::open()?;
    let rule = create_rule(&ctx.conn, &ctx.session, matcher, category, confidence)?;
    println!(
        "Added rule {}: '{}' \u{2192} {} ({}%)",
        rule.id, rule.matcher, rule.category, rule.confidence
    );
    Ok(())
}

pub fn list() -> Result<()> {
    let ctx = super::open()?;
    let rules = list_rules(&ctx.conn, &ctx.session)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Pattern", "Category", "Confidence"]);
    for rule in rules {
        table.add_row(vec![
            Cell::new(rule.id),
            Cell::new(rule.matcher),
            Cell::new(rule.category),
            Cell::new(format!("{}%", rule.confidence)),
        ]);
    }
    println!("Rules\n{table}");
    Ok(())
}

pub fn update(id: i64, matcher: Option<&str>, category: Option<&str>, confidence: Option<i64>) -> Result<()> {
    let ctx = super::open()?;
    let rule = update_rule(&ctx.conn, &ctx.session, id, matcher, category, confidence)?;
    println!(
        "Updated rule {id}: '{}' \u{2192} {} ({}%)",
        rule.matcher, rule.category, rule.confidence
    );
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let ctx = super::open()?;
    let rule = get_rule(&ctx.conn, &ctx.session, id)?;
    delete_rule(&ctx.conn, &ctx.session, id)?;
    println!("Deleted rule {id}: '{}' \u{2192} {}", rule.matcher, rule.category);
    Ok(())
}
