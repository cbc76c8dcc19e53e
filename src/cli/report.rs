use chrono::Datelike;
use colored::Colorize;
use comfy_table::{Cell, Table};

use super::budgets::{remaining_cell, status_label};
use super::categories::swatch;
use super::{parse_date_opt, today};
use crate::error::Result;
use crate::fmt::percent;
use crate::reports::{budget_overview, monthly_spending, spending_by_category};

pub fn spending(from_date: Option<&str>, to_date: Option<&str>) -> Result<()> {
    let ctx = super::open()?;
    let today = today();
    let to = parse_date_opt(to_date)?.unwrap_or(today);
    let from = match parse_date_opt(from_date)? {
        Some(from) => from,
        None => to.with_day(1).unwrap_or(to),
    };
    let report = spending_by_category(&ctx.conn, &ctx.session, from, to)?;

    let mut table = Table::new();
    table.set_header(vec!["Category", "Spent", "Share"]);
    for c in &report.categories {
        table.add_row(vec![
            Cell::new(swatch(&c.category, &c.color)),
            Cell::new(ctx.money(c.amount_cents)),
            Cell::new(percent(c.percentage)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL".bold()),
        Cell::new(ctx.money(report.total_cents).bold()),
        Cell::new(""),
    ]);
    println!("Spending {} to {}\n{table}", report.from, report.to);
    Ok(())
}

pub fn monthly(months: u32) -> Result<()> {
    let ctx = super::open()?;
    let report = monthly_spending(&ctx.conn, &ctx.session, months, today())?;

    let mut table = Table::new();
    table.set_header(vec!["Month", "Spent"]);
    for m in &report.months {
        table.add_row(vec![Cell::new(&m.month), Cell::new(ctx.money(m.amount_cents))]);
    }
    println!("Monthly spending (last {months} months)\n{table}");
    println!("Total:    {}", ctx.money(report.total_cents));
    println!("Average:  {} per month", ctx.money(report.average_cents));
    match &report.top_category {
        Some(top) => println!(
            "Top:      {} ({})",
            swatch(&top.category, &top.color),
            ctx.money(top.amount_cents)
        ),
        None => println!("Top:      -"),
    }
    Ok(())
}

pub fn budgets() -> Result<()> {
    let ctx = super::open()?;
    let overview = budget_overview(&ctx.conn, &ctx.session, today())?;

    let mut table = Table::new();
    table.set_header(vec!["Budget", "Budgeted", "Spent", "Remaining", "Used", "Days Left", "Status"]);
    for a in &overview.budgets {
        match &a.current {
            Some(c) => table.add_row(vec![
                Cell::new(&a.budget.name),
                Cell::new(ctx.money(c.budgeted_amount_cents)),
                Cell::new(ctx.money(c.spent_amount_cents)),
                remaining_cell(&ctx, c.remaining_amount_cents),
                Cell::new(percent(c.percentage_used)),
                Cell::new(c.days_remaining),
                Cell::new(status_label(c.status)),
            ]),
            None => table.add_row(vec![
                Cell::new(&a.budget.name),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("No current period".dimmed()),
            ]),
        };
    }
    table.add_row(vec![
        Cell::new("TOTAL".bold()),
        Cell::new(ctx.money(overview.total_budgeted_cents).bold()),
        Cell::new(ctx.money(overview.total_spent_cents).bold()),
        remaining_cell(&ctx, overview.total_remaining_cents),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
    ]);
    println!("Budgets\n{table}");

    let s = &overview.statuses;
    println!(
        "{} on track, {} near limit, {} over budget",
        s.on_track.to_string().green(),
        s.near_limit.to_string().yellow(),
        s.over_budget.to_string().red()
    );
    if overview.over_budget_count() > 0 {
        println!("{}", format!("{} budget(s) over their limit", overview.over_budget_count()).red().bold());
    }
    Ok(())
}
