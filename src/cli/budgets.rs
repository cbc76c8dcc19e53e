use colored::{ColoredString, Colorize};
use comfy_table::{Cell, Table};

use super::{parse_cents, parse_date, parse_date_opt, today, Context};
use crate::backend::budgets::{
    create_budget, delete_budget, generate_periods, list_budgets, refresh_spend, update_budget, BudgetChanges,
    NewBudget,
};
use crate::error::Result;
use crate::fmt::percent;
use crate::periods::{BudgetStatus, RecurrenceType};
use crate::reports::budget_analytics;

pub(crate) fn status_label(status: BudgetStatus) -> ColoredString {
    match status {
        BudgetStatus::OnTrack => status.label().green(),
        BudgetStatus::NearLimit => status.label().yellow(),
        BudgetStatus::OverBudget => status.label().red().bold(),
    }
}

pub(crate) fn remaining_cell(ctx: &Context, cents: i64) -> Cell {
    if cents < 0 {
        Cell::new(format!("-{}", ctx.money(-cents)).red())
    } else {
        Cell::new(ctx.money(cents))
    }
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    category: &str,
    amount: &str,
    name: Option<String>,
    start: Option<&str>,
    every: &str,
    interval: u32,
    end: Option<&str>,
) -> Result<()> {
    let mut ctx = super::open()?;
    let today = today();
    let new = NewBudget {
        category: category.to_string(),
        name,
        amount_cents: parse_cents(amount)?,
        start_date: parse_date_opt(start)?.unwrap_or(today),
        recurrence_type: every.parse::<RecurrenceType>()?,
        recurrence_interval: interval,
        end_date: parse_date_opt(end)?,
    };
    let horizon = ctx.horizon(today);
    let budget = create_budget(&mut ctx.conn, &ctx.session, &new, horizon)?;
    println!(
        "Added budget {}: {} {} {} from {}",
        budget.id,
        budget.name,
        ctx.money(budget.amount_cents),
        budget.recurrence.label().to_lowercase(),
        budget.start_date
    );
    Ok(())
}

pub fn list(all: bool) -> Result<()> {
    let ctx = super::open()?;
    let today = today();
    let budgets = list_budgets(&ctx.conn, &ctx.session, !all)?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Name", "Category", "Amount", "Repeats", "Period", "Spent", "Remaining", "Used", "Status",
    ]);
    for budget in budgets {
        let analytics = budget_analytics(&ctx.conn, &ctx.session, budget.id, today)?;
        let mut row = vec![
            Cell::new(budget.id),
            Cell::new(&budget.name),
            Cell::new(&budget.category_name),
            Cell::new(ctx.money(budget.amount_cents)),
            Cell::new(budget.recurrence.label()),
        ];
        match &analytics.current {
            Some(current) => row.extend([
                Cell::new(format!("{} to {}", current.period_start, current.period_end)),
                Cell::new(ctx.money(current.spent_amount_cents)),
                remaining_cell(&ctx, current.remaining_amount_cents),
                Cell::new(percent(current.percentage_used)),
                Cell::new(status_label(current.status)),
            ]),
            None => row.extend([
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(if budget.is_active { "No current period".dimmed() } else { "Inactive".dimmed() }),
            ]),
        }
        table.add_row(row);
    }
    println!("Budgets\n{table}");
    Ok(())
}

pub fn show(id: i64) -> Result<()> {
    let ctx = super::open()?;
    let today = today();
    let analytics = budget_analytics(&ctx.conn, &ctx.session, id, today)?;
    let budget = &analytics.budget;

    println!("{}", budget.name.bold());
    println!("Category:   {}", budget.category_name);
    println!("Amount:     {} {}", ctx.money(budget.amount_cents), budget.recurrence.label().to_lowercase());
    match budget.end_date {
        Some(end) => println!("Runs:       {} to {}", budget.start_date, end),
        None => println!("Runs:       from {}", budget.start_date),
    }
    if !budget.is_active {
        println!("Status:     {}", "inactive".dimmed());
    }

    println!();
    match &analytics.current {
        Some(c) => {
            println!("Current period {} to {}", c.period_start, c.period_end);
            println!(
                "  Spent {} of {} ({}), {} left, {} days remaining: {}",
                ctx.money(c.spent_amount_cents),
                ctx.money(c.budgeted_amount_cents),
                percent(c.percentage_used),
                ctx.money(c.remaining_amount_cents.max(0)),
                c.days_remaining,
                status_label(c.status)
            );
        }
        None => println!("No period covers {today}."),
    }

    if analytics.history.is_empty() {
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["Period", "Budgeted", "Spent", "Remaining", "Used", "Status"]);
    for h in analytics.history.iter().rev() {
        table.add_row(vec![
            Cell::new(format!("{} to {}", h.period_start, h.period_end)),
            Cell::new(ctx.money(h.budgeted_amount_cents)),
            Cell::new(ctx.money(h.spent_amount_cents)),
            remaining_cell(&ctx, h.remaining_amount_cents),
            Cell::new(percent(h.percentage_used)),
            Cell::new(status_label(h.status)),
        ]);
    }
    println!("\nHistory\n{table}");

    let s = &analytics.summary;
    let variance = if s.total_variance_cents > 0 {
        format!("{} over", ctx.money(s.total_variance_cents)).red()
    } else {
        format!("{} under", ctx.money(-s.total_variance_cents)).green()
    };
    println!(
        "{} periods, {} over budget, average {} used, {}",
        s.total_periods,
        s.over_budget_periods,
        percent(s.average_usage),
        variance
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn update(
    id: i64,
    name: Option<String>,
    amount: Option<&str>,
    start: Option<&str>,
    every: Option<&str>,
    interval: Option<u32>,
    end: Option<&str>,
    no_end: bool,
    active: Option<bool>,
) -> Result<()> {
    let mut ctx = super::open()?;
    let today = today();
    let end_date = if no_end {
        Some(None)
    } else {
        end.map(parse_date).transpose()?.map(Some)
    };
    let changes = BudgetChanges {
        name,
        amount_cents: amount.map(parse_cents).transpose()?,
        start_date: parse_date_opt(start)?,
        recurrence_type: every.map(str::parse::<RecurrenceType>).transpose()?,
        recurrence_interval: interval,
        end_date,
        is_active: active,
    };
    let horizon = ctx.horizon(today);
    let budget = update_budget(&mut ctx.conn, &ctx.session, id, &changes, horizon, today)?;
    println!(
        "Updated budget {id}: {} {} {}",
        budget.name,
        ctx.money(budget.amount_cents),
        budget.recurrence.label().to_lowercase()
    );
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let ctx = super::open()?;
    delete_budget(&ctx.conn, &ctx.session, id)?;
    println!("Deleted budget {id}");
    Ok(())
}

pub fn refresh() -> Result<()> {
    let ctx = super::open()?;
    let horizon = ctx.horizon(today());
    let mut added = 0;
    for budget in list_budgets(&ctx.conn, &ctx.session, false)? {
        added += generate_periods(&ctx.conn, &ctx.session, budget.id, horizon)?;
    }
    let refreshed = refresh_spend(&ctx.conn, &ctx.session)?;
    println!("{added} periods added, {refreshed} periods refreshed (through {horizon})");
    Ok(())
}
