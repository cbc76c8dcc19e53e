use chrono::NaiveDate;
use rusqlite::{Connection, Row};

use super::categories::require_category;
use super::{expect_affected, not_found};
use crate::error::{validation, Result};
use crate::models::{Budget, BudgetPeriod};
use crate::periods::{self, Recurrence, RecurrenceType};
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct NewBudget {
    /// Category name; the budget is named after it unless `name` is given.
    pub category: String,
    pub name: Option<String>,
    pub amount_cents: i64,
    pub start_date: NaiveDate,
    pub recurrence_type: RecurrenceType,
    pub recurrence_interval: u32,
    pub end_date: Option<NaiveDate>,
}

/// Fields left `None` keep their stored value. `end_date: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct BudgetChanges {
    pub name: Option<String>,
    pub amount_cents: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub recurrence_type: Option<RecurrenceType>,
    pub recurrence_interval: Option<u32>,
    pub end_date: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
}

impl BudgetChanges {
    fn touches_timing(&self) -> bool {
        self.start_date.is_some()
            || self.recurrence_type.is_some()
            || self.recurrence_interval.is_some()
            || self.end_date.is_some()
    }
}

fn check_amount(amount_cents: i64) -> Result<()> {
    if amount_cents <= 0 {
        return Err(validation("budget amount must be greater than zero"));
    }
    Ok(())
}

fn check_dates(start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
    match end {
        Some(end) if end < start => Err(validation(format!(
            "end date {end} is before start date {start}"
        ))),
        _ => Ok(()),
    }
}

const SELECT_BUDGET: &str = "SELECT b.id, b.category_id, c.name, b.name, b.amount_cents, b.start_date, \
     b.recurrence_type, b.recurrence_interval, b.end_date, b.is_active \
     FROM budgets b JOIN categories c ON b.category_id = c.id";

struct BudgetRow {
    id: i64,
    category_id: i64,
    category_name: String,
    name: String,
    amount_cents: i64,
    start_date: NaiveDate,
    recurrence_type: String,
    recurrence_interval: i64,
    end_date: Option<NaiveDate>,
    is_active: bool,
}

impl BudgetRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            category_id: row.get(1)?,
            category_name: row.get(2)?,
            name: row.get(3)?,
            amount_cents: row.get(4)?,
            start_date: row.get(5)?,
            recurrence_type: row.get(6)?,
            recurrence_interval: row.get(7)?,
            end_date: row.get(8)?,
            is_active: row.get(9)?,
        })
    }

    fn into_budget(self) -> Result<Budget> {
        let interval = u32::try_from(self.recurrence_interval)
            .map_err(|_| validation(format!("budget {} has a bad interval", self.id)))?;
        let recurrence = Recurrence::new(self.recurrence_type.parse()?, interval)?;
        Ok(Budget {
            id: self.id,
            category_id: self.category_id,
            category_name: self.category_name,
            name: self.name,
            amount_cents: self.amount_cents,
            start_date: self.start_date,
            recurrence,
            end_date: self.end_date,
            is_active: self.is_active,
        })
    }
}

pub fn list_budgets(conn: &Connection, session: &Session, active_only: bool) -> Result<Vec<Budget>> {
    let sql = format!(
        "{SELECT_BUDGET} WHERE b.owner = ?1 AND (?2 = 0 OR b.is_active = 1) ORDER BY b.name, b.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params![session.user_id, active_only], BudgetRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(BudgetRow::into_budget).collect()
}

pub fn get_budget(conn: &Connection, session: &Session, id: i64) -> Result<Budget> {
    let sql = format!("{SELECT_BUDGET} WHERE b.id = ?1 AND b.owner = ?2");
    conn.query_row(&sql, rusqlite::params![id, session.user_id], BudgetRow::from_row)
        .map_err(not_found("budget", id))?
        .into_budget()
}

/// Validates, stores the budget, and lays out its periods up to `horizon`
/// with spend already filled in. All or nothing.
pub fn create_budget(
    conn: &mut Connection,
    session: &Session,
    new: &NewBudget,
    horizon: NaiveDate,
) -> Result<Budget> {
    check_amount(new.amount_cents)?;
    let recurrence = Recurrence::new(new.recurrence_type, new.recurrence_interval)?;
    check_dates(new.start_date, new.end_date)?;
    let category = require_category(conn, session, &new.category)?;
    let name = new
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(category.name.as_str())
        .to_string();

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO budgets (owner, category_id, name, amount_cents, start_date, \
         recurrence_type, recurrence_interval, end_date) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            session.user_id,
            category.id,
            name,
            new.amount_cents,
            new.start_date,
            recurrence.kind().as_str(),
            recurrence.interval(),
            new.end_date,
        ],
    )?;
    let id = tx.last_insert_rowid();
    generate_periods(&tx, session, id, horizon)?;
    refresh_budget_spend(&tx, id)?;
    tx.commit()?;

    tracing::info!(owner = %session.user_id, id, name = %name, "created budget");
    get_budget(conn, session, id)
}

/// Timing changes rebuild the period list; an amount change re-prices the
/// periods that haven't ended yet.
pub fn update_budget(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    changes: &BudgetChanges,
    horizon: NaiveDate,
    today: NaiveDate,
) -> Result<Budget> {
    let current = get_budget(conn, session, id)?;

    let amount_cents = changes.amount_cents.unwrap_or(current.amount_cents);
    check_amount(amount_cents)?;
    let recurrence = Recurrence::new(
        changes.recurrence_type.unwrap_or(current.recurrence.kind()),
        changes.recurrence_interval.unwrap_or(current.recurrence.interval()),
    )?;
    let start_date = changes.start_date.unwrap_or(current.start_date);
    let end_date = changes.end_date.unwrap_or(current.end_date);
    check_dates(start_date, end_date)?;
    let name = match changes.name.as_deref().map(str::trim) {
        Some("") => return Err(validation("budget name cannot be empty")),
        Some(n) => n.to_string(),
        None => current.name.clone(),
    };
    let is_active = changes.is_active.unwrap_or(current.is_active);

    let tx = conn.transaction()?;
    let affected = tx.execute(
        "UPDATE budgets SET name = ?1, amount_cents = ?2, start_date = ?3, recurrence_type = ?4, \
         recurrence_interval = ?5, end_date = ?6, is_active = ?7, updated_at = datetime('now') \
         WHERE id = ?8 AND owner = ?9",
        rusqlite::params![
            name,
            amount_cents,
            start_date,
            recurrence.kind().as_str(),
            recurrence.interval(),
            end_date,
            is_active,
            id,
            session.user_id,
        ],
    )?;
    expect_affected(affected, "budget", id)?;

    if changes.touches_timing() {
        tx.execute("DELETE FROM budget_periods WHERE budget_id = ?1", [id])?;
        generate_periods(&tx, session, id, horizon)?;
        refresh_budget_spend(&tx, id)?;
        tracing::info!(owner = %session.user_id, id, "regenerated budget periods");
    } else if amount_cents != current.amount_cents {
        tx.execute(
            "UPDATE budget_periods SET budgeted_amount_cents = ?1 \
             WHERE budget_id = ?2 AND period_end >= ?3",
            rusqlite::params![amount_cents, id, today],
        )?;
    }
    tx.commit()?;

    tracing::info!(owner = %session.user_id, id, "updated budget");
    get_budget(conn, session, id)
}

pub fn delete_budget(conn: &Connection, session: &Session, id: i64) -> Result<()> {
    let affected = conn.execute(
        "DELETE FROM budgets WHERE id = ?1 AND owner = ?2",
        rusqlite::params![id, session.user_id],
    )?;
    expect_affected(affected, "budget", id)?;
    tracing::info!(owner = %session.user_id, id, "deleted budget");
    Ok(())
}

pub fn list_periods(conn: &Connection, session: &Session, budget_id: i64) -> Result<Vec<BudgetPeriod>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.budget_id, p.period_start, p.period_end, p.budgeted_amount_cents, \
         p.spent_amount_cents \
         FROM budget_periods p JOIN budgets b ON p.budget_id = b.id \
         WHERE p.budget_id = ?1 AND b.owner = ?2 ORDER BY p.period_start",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![budget_id, session.user_id], |row| {
            Ok(BudgetPeriod {
                id: row.get(0)?,
                budget_id: row.get(1)?,
                period_start: row.get(2)?,
                period_end: row.get(3)?,
                budgeted_amount_cents: row.get(4)?,
                spent_amount_cents: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Store every period of the budget that starts on or before `horizon`.
/// Periods already present are left alone, so calling this again only
/// extends the list. Returns how many periods were added.
pub fn generate_periods(
    conn: &Connection,
    session: &Session,
    budget_id: i64,
    horizon: NaiveDate,
) -> Result<usize> {
    let budget = get_budget(conn, session, budget_id)?;
    let bounds = periods::generate_periods(budget.start_date, budget.recurrence, budget.end_date, horizon);

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO budget_periods (budget_id, period_start, period_end, budgeted_amount_cents) \
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut added = 0usize;
    for b in &bounds {
        added += stmt.execute(rusqlite::params![budget_id, b.start, b.end, budget.amount_cents])?;
    }
    tracing::debug!(budget_id, added, total = bounds.len(), %horizon, "generated budget periods");
    Ok(added)
}

const REFRESH_SPEND: &str = "UPDATE budget_periods SET spent_amount_cents = ( \
         SELECT COALESCE(SUM(-t.amount_cents), 0) \
         FROM transactions t \
         JOIN accounts a ON t.account_id = a.id \
         JOIN budgets b ON b.id = budget_periods.budget_id \
         JOIN categories c ON c.id = b.category_id \
         WHERE a.owner = b.owner AND t.category = c.name AND t.amount_cents < 0 \
           AND t.posted_at BETWEEN budget_periods.period_start AND budget_periods.period_end)";

fn refresh_budget_spend(conn: &Connection, budget_id: i64) -> Result<usize> {
    let sql = format!("{REFRESH_SPEND} WHERE budget_id = ?1");
    Ok(conn.execute(&sql, [budget_id])?)
}

/// Recompute spend of the owner's budgets tracking the category named `category`.
pub(crate) fn refresh_category_spend(conn: &Connection, session: &Session, category: &str) -> Result<usize> {
    let sql = format!(
        "{REFRESH_SPEND} WHERE budget_id IN (SELECT b.id FROM budgets b \
         JOIN categories c ON c.id = b.category_id WHERE b.owner = ?1 AND c.name = ?2)"
    );
    let updated = conn.execute(&sql, rusqlite::params![session.user_id, category])?;
    tracing::debug!(owner = %session.user_id, category, periods = updated, "refreshed category spend");
    Ok(updated)
}

/// Recompute spent amounts of every period of the owner's budgets from the
/// expense transactions in each budget's category. Returns periods touched.
pub fn refresh_spend(conn: &Connection, session: &Session) -> Result<usize> {
    let sql = format!("{REFRESH_SPEND} WHERE budget_id IN (SELECT id FROM budgets WHERE owner = ?1)");
    let updated = conn.execute(&sql, [&session.user_id])?;
    tracing::info!(owner = %session.user_id, periods = updated, "refreshed budget spend");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::accounts::insert_account;
    use crate::backend::categories::create_category;
    use crate::backend::transactions::{insert_transaction, set_category};
    use crate::db::test_db;
    use crate::error::PocketbookError;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn groceries_monthly(amount_cents: i64) -> NewBudget {
        NewBudget {
            category: "Groceries".to_string(),
            name: None,
            amount_cents,
            start_date: d("2024-01-01"),
            recurrence_type: RecurrenceType::Monthly,
            recurrence_interval: 1,
            end_date: None,
        }
    }

    fn setup() -> (tempfile::TempDir, Connection, Session) {
        let (dir, conn) = test_db();
        let s = Session::new("alice");
        create_category(&conn, &s, "Groceries", "green").unwrap();
        create_category(&conn, &s, "Dining", "orange").unwrap();
        (dir, conn, s)
    }

    fn spend(conn: &Connection, s: &Session, date: &str, cents: i64, category: &str) {
        let acct: i64 = match conn.query_row("SELECT id FROM accounts LIMIT 1", [], |r| r.get(0)) {
            Ok(id) => id,
            Err(_) => insert_account(conn, s, "Everyday", "checking").unwrap(),
        };
        let id = insert_transaction(conn, s, acct, d(date), cents, "SHOP").unwrap();
        set_category(conn, s, id, category).unwrap();
    }

    #[test]
    fn test_create_budget_generates_periods() {
        let (_dir, mut conn, s) = setup();
        let budget = create_budget(&mut conn, &s, &groceries_monthly(40000), d("2024-03-10")).unwrap();
        assert_eq!(budget.name, "Groceries");
        assert_eq!(budget.recurrence.label(), "Every month");

        let periods = list_periods(&conn, &s, budget.id).unwrap();
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[1].period_start, d("2024-02-01"));
        assert_eq!(periods[1].period_end, d("2024-02-29"));
        assert!(periods.iter().all(|p| p.budgeted_amount_cents == 40000));
    }

    #[test]
    fn test_create_budget_validation() {
        let (_dir, mut conn, s) = setup();
        let horizon = d("2024-12-31");
        assert!(matches!(
            create_budget(&mut conn, &s, &groceries_monthly(0), horizon),
            Err(PocketbookError::Validation(_))
        ));
        let mut bad = groceries_monthly(100);
        bad.recurrence_interval = 0;
        assert!(create_budget(&mut conn, &s, &bad, horizon).is_err());
        let mut bad = groceries_monthly(100);
        bad.end_date = Some(d("2023-12-31"));
        assert!(create_budget(&mut conn, &s, &bad, horizon).is_err());
        let mut bad = groceries_monthly(100);
        bad.category = "Nope".to_string();
        assert!(matches!(
            create_budget(&mut conn, &s, &bad, horizon),
            Err(PocketbookError::UnknownCategory(_))
        ));
        assert!(list_budgets(&conn, &s, false).unwrap().is_empty());
    }

    #[test]
    fn test_generate_periods_is_idempotent_and_extends() {
        let (_dir, mut conn, s) = setup();
        let budget = create_budget(&mut conn, &s, &groceries_monthly(40000), d("2024-01-15")).unwrap();
        assert_eq!(generate_periods(&conn, &s, budget.id, d("2024-01-15")).unwrap(), 0);
        assert_eq!(generate_periods(&conn, &s, budget.id, d("2024-04-01")).unwrap(), 3);
        assert_eq!(list_periods(&conn, &s, budget.id).unwrap().len(), 4);
    }

    #[test]
    fn test_refresh_spend_counts_only_category_expenses_in_period() {
        let (_dir, mut conn, s) = setup();
        let budget = create_budget(&mut conn, &s, &groceries_monthly(40000), d("2024-02-15")).unwrap();
        spend(&conn, &s, "2024-01-03", -12000, "Groceries");
        spend(&conn, &s, "2024-01-31", -3000, "Groceries");
        spend(&conn, &s, "2024-02-01", -5000, "Groceries");
        spend(&conn, &s, "2024-01-10", -9999, "Dining");
        spend(&conn, &s, "2024-01-12", 2000, "Groceries");

        assert_eq!(refresh_spend(&conn, &s).unwrap(), 2);
        let periods = list_periods(&conn, &s, budget.id).unwrap();
        assert_eq!(periods[0].spent_amount_cents, 15000);
        assert_eq!(periods[1].spent_amount_cents, 5000);
    }

    #[test]
    fn test_timing_change_regenerates_periods() {
        let (_dir, mut conn, s) = setup();
        let budget = create_budget(&mut conn, &s, &groceries_monthly(40000), d("2024-03-10")).unwrap();
        let changes = BudgetChanges {
            recurrence_type: Some(RecurrenceType::Weekly),
            recurrence_interval: Some(2),
            ..BudgetChanges::default()
        };
        let updated = update_budget(&mut conn, &s, budget.id, &changes, d("2024-01-31"), d("2024-01-01")).unwrap();
        assert_eq!(updated.recurrence.label(), "Every 2 weeks");
        let periods = list_periods(&conn, &s, budget.id).unwrap();
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].period_end, d("2024-01-14"));
        assert_eq!(periods[2].period_start, d("2024-01-29"));
    }

    #[test]
    fn test_amount_change_reprices_open_periods_only() {
        let (_dir, mut conn, s) = setup();
        let budget = create_budget(&mut conn, &s, &groceries_monthly(40000), d("2024-03-10")).unwrap();
        let changes = BudgetChanges {
            amount_cents: Some(50000),
            ..BudgetChanges::default()
        };
        update_budget(&mut conn, &s, budget.id, &changes, d("2024-03-10"), d("2024-02-10")).unwrap();
        let amounts: Vec<i64> = list_periods(&conn, &s, budget.id)
            .unwrap()
            .iter()
            .map(|p| p.budgeted_amount_cents)
            .collect();
        assert_eq!(amounts, vec![40000, 50000, 50000]);
    }

    #[test]
    fn test_clear_end_date_and_deactivate() {
        let (_dir, mut conn, s) = setup();
        let mut new = groceries_monthly(40000);
        new.end_date = Some(d("2024-01-31"));
        let budget = create_budget(&mut conn, &s, &new, d("2024-06-01")).unwrap();
        assert_eq!(list_periods(&conn, &s, budget.id).unwrap().len(), 1);

        let changes = BudgetChanges {
            end_date: Some(None),
            is_active: Some(false),
            ..BudgetChanges::default()
        };
        let updated = update_budget(&mut conn, &s, budget.id, &changes, d("2024-06-01"), d("2024-01-15")).unwrap();
        assert!(updated.end_date.is_none());
        assert!(!updated.is_active);
        assert_eq!(list_periods(&conn, &s, budget.id).unwrap().len(), 6);
        assert!(list_budgets(&conn, &s, true).unwrap().is_empty());
    }

    #[test]
    fn test_delete_budget_removes_periods() {
        let (_dir, mut conn, s) = setup();
        let budget = create_budget(&mut conn, &s, &groceries_monthly(40000), d("2024-03-10")).unwrap();
        assert!(delete_budget(&conn, &Session::new("bob"), budget.id).is_err());
        delete_budget(&conn, &s, budget.id).unwrap();
        let left: i64 = conn
            .query_row("SELECT count(*) FROM budget_periods", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn test_category_with_budget_cannot_be_deleted() {
        let (_dir, mut conn, s) = setup();
        let budget = create_budget(&mut conn, &s, &groceries_monthly(40000), d("2024-03-10")).unwrap();
        let result = crate::backend::categories::delete_category(&conn, &s, budget.category_id);
        assert!(matches!(result, Err(PocketbookError::Validation(_))));
    }
}
