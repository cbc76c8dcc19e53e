use chrono::{Datelike, Months, NaiveDate};
use rusqlite::Connection;

use crate::backend::budgets::{get_budget, list_budgets, list_periods};
use crate::backend::categories::FALLBACK_COLOR;
use crate::error::{validation, Result};
use crate::models::Budget;
use crate::periods::{self, BudgetStatus, HistorySummary, PeriodUsage};
use crate::session::Session;

pub const UNCATEGORIZED: &str = "Uncategorized";

// ---------------------------------------------------------------------------
// Spending by category
// ---------------------------------------------------------------------------

pub struct CategorySpending {
    pub category: String,
    pub color: String,
    pub amount_cents: i64,
    pub percentage: f64,
}

pub struct SpendingReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub categories: Vec<CategorySpending>,
    pub total_cents: i64,
}

/// Expenses between `from` and `to` (both inclusive), biggest first.
pub fn spending_by_category(
    conn: &Connection,
    session: &Session,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<SpendingReport> {
    if from > to {
        return Err(validation(format!("--from {from} is after --to {to}")));
    }
    let mut stmt = conn.prepare(
        "SELECT COALESCE(t.category, ?1), c.color, SUM(-t.amount_cents) AS total \
         FROM transactions t \
         JOIN accounts a ON t.account_id = a.id \
         LEFT JOIN categories c ON c.owner = a.owner AND c.name = t.category \
         WHERE a.owner = ?2 AND t.amount_cents < 0 AND t.posted_at BETWEEN ?3 AND ?4 \
         GROUP BY 1, 2 \
         ORDER BY total DESC, 1",
    )?;
    let rows = stmt
        .query_map(
            rusqlite::params![UNCATEGORIZED, session.user_id, from, to],
            |row| {
                let color: Option<String> = row.get(1)?;
                Ok((row.get::<_, String>(0)?, color, row.get::<_, i64>(2)?))
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let total_cents: i64 = rows.iter().map(|(_, _, amount)| amount).sum();
    let categories = rows
        .into_iter()
        .map(|(category, color, amount_cents)| CategorySpending {
            category,
            color: color.unwrap_or_else(|| FALLBACK_COLOR.to_string()),
            amount_cents,
            percentage: share(amount_cents, total_cents),
        })
        .collect();

    tracing::debug!(owner = %session.user_id, %from, %to, total_cents, "spending by category");
    Ok(SpendingReport {
        from,
        to,
        categories,
        total_cents,
    })
}

fn share(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 10000.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Monthly spending
// ---------------------------------------------------------------------------

pub struct MonthSpending {
    /// `YYYY-MM`
    pub month: String,
    pub amount_cents: i64,
}

pub struct MonthlyReport {
    pub months: Vec<MonthSpending>,
    pub total_cents: i64,
    pub average_cents: i64,
    pub top_category: Option<CategorySpending>,
}

/// The last `months` calendar months up to and including the month of
/// `today`, oldest first. Months without spending are reported as zero.
pub fn monthly_spending(
    conn: &Connection,
    session: &Session,
    months: u32,
    today: NaiveDate,
) -> Result<MonthlyReport> {
    if months == 0 {
        return Err(validation("months must be at least 1"));
    }
    let this_month = today.with_day(1).unwrap_or(today);
    let first = this_month
        .checked_sub_months(Months::new(months - 1))
        .ok_or_else(|| validation(format!("cannot look back {months} months")))?;

    let mut stmt = conn.prepare(
        "SELECT substr(t.posted_at, 1, 7) AS month, SUM(-t.amount_cents) \
         FROM transactions t JOIN accounts a ON t.account_id = a.id \
         WHERE a.owner = ?1 AND t.amount_cents < 0 AND t.posted_at BETWEEN ?2 AND ?3 \
         GROUP BY month",
    )?;
    let totals = stmt
        .query_map(rusqlite::params![session.user_id, first, today], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<std::result::Result<std::collections::HashMap<_, _>, _>>()?;

    let mut report_months = Vec::with_capacity(months as usize);
    for n in 0..months {
        let Some(month_start) = first.checked_add_months(Months::new(n)) else {
            break;
        };
        let key = month_start.format("%Y-%m").to_string();
        let amount_cents = totals.get(&key).copied().unwrap_or(0);
        report_months.push(MonthSpending {
            month: key,
            amount_cents,
        });
    }

    let total_cents: i64 = report_months.iter().map(|m| m.amount_cents).sum();
    let top_category = spending_by_category(conn, session, first, today)?
        .categories
        .into_iter()
        .next();

    Ok(MonthlyReport {
        months: report_months,
        total_cents,
        average_cents: total_cents / i64::from(months),
        top_category,
    })
}

// ---------------------------------------------------------------------------
// Budget analytics
// ---------------------------------------------------------------------------

pub struct BudgetAnalytics {
    pub budget: Budget,
    /// `None` when today falls outside every stored period.
    pub current: Option<PeriodUsage>,
    pub history: Vec<PeriodUsage>,
    pub summary: HistorySummary,
}

pub fn budget_analytics(
    conn: &Connection,
    session: &Session,
    budget_id: i64,
    today: NaiveDate,
) -> Result<BudgetAnalytics> {
    let budget = get_budget(conn, session, budget_id)?;
    analytics_for(conn, session, budget, today)
}

fn analytics_for(
    conn: &Connection,
    session: &Session,
    budget: Budget,
    today: NaiveDate,
) -> Result<BudgetAnalytics> {
    let stored = list_periods(conn, session, budget.id)?;
    let current = periods::current_period(&stored, today).map(|p| periods::usage(p, today));
    let history = periods::history(&stored, today);
    let summary = periods::summarize_history(&history);
    Ok(BudgetAnalytics {
        budget,
        current,
        history,
        summary,
    })
}

pub fn all_budget_analytics(
    conn: &Connection,
    session: &Session,
    today: NaiveDate,
) -> Result<Vec<BudgetAnalytics>> {
    list_budgets(conn, session, true)?
        .into_iter()
        .map(|budget| analytics_for(conn, session, budget, today))
        .collect()
}

#[derive(Debug, Default, PartialEq)]
pub struct StatusCounts {
    pub on_track: usize,
    pub near_limit: usize,
    pub over_budget: usize,
}

pub struct BudgetOverview {
    pub budgets: Vec<BudgetAnalytics>,
    pub total_budgeted_cents: i64,
    pub total_spent_cents: i64,
    pub total_remaining_cents: i64,
    pub statuses: StatusCounts,
}

impl BudgetOverview {
    pub fn over_budget_count(&self) -> usize {
        self.statuses.over_budget
    }
}

/// Totals over the current period of every active budget.
pub fn budget_overview(conn: &Connection, session: &Session, today: NaiveDate) -> Result<BudgetOverview> {
    let budgets = all_budget_analytics(conn, session, today)?;
    let mut total_budgeted_cents = 0;
    let mut total_spent_cents = 0;
    let mut statuses = StatusCounts::default();

    for current in budgets.iter().filter_map(|a| a.current.as_ref()) {
        total_budgeted_cents += current.budgeted_amount_cents;
        total_spent_cents += current.spent_amount_cents;
        match current.status {
            BudgetStatus::OnTrack => statuses.on_track += 1,
            BudgetStatus::NearLimit => statuses.near_limit += 1,
            BudgetStatus::OverBudget => statuses.over_budget += 1,
        }
    }

    Ok(BudgetOverview {
        budgets,
        total_budgeted_cents,
        total_spent_cents,
        total_remaining_cents: total_budgeted_cents - total_spent_cents,
        statuses,
    })
}
