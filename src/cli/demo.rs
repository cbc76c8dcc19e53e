use chrono::{Days, Months, NaiveDate};
use rusqlite::Connection;

use crate::backend::accounts::insert_account;
use crate::backend::budgets::{create_budget, NewBudget};
use crate::backend::categories::create_category;
use crate::backend::rules::create_rule;
use crate::backend::transactions::insert_transaction;
use crate::categorizer::apply_rules;
use crate::error::Result;
use crate::periods::RecurrenceType;
use crate::session::Session;

const ACCOUNT_NAME: &str = "Everyday Checking";

/// How many months of history the demo covers, current month included.
const DEMO_MONTHS: u32 = 4;

const CATEGORIES: &[(&str, &str)] = &[
    ("Groceries", "green"),
    ("Dining", "orange"),
    ("Transport", "blue"),
    ("Entertainment", "purple"),
    ("Shopping", "pink"),
    ("Health", "red"),
    ("Income", "cyan"),
];

/// Transactions repeated every month: (day, description, cents).
const MONTHLY: &[(u32, &str, i64)] = &[
    (1, "PAYROLL ACME CORP", 420000),
    (2, "WHOLE FOODS MARKET #112", -8743),
    (4, "UBER TRIP HELP.UBER.COM", -1850),
    (6, "NETFLIX.COM", -1549),
    (9, "TRADER JOE'S #540", -6412),
    (11, "UBER EATS PENDING", -3275),
    (15, "PAYROLL ACME CORP", 420000),
    (16, "SHELL OIL 5744", -5210),
    (18, "SPOTIFY USA", -1199),
    (21, "WHOLE FOODS MARKET #112", -11208),
    (24, "UBER EATS PENDING", -2890),
];

/// One-off purchases, one picked per month by index; left for manual review.
const ROTATING: &[(u32, &str, i64)] = &[
    (13, "TARGET STORE T-1234", -4367),
    (19, "CVS PHARMACY #2281", -2315),
    (26, "BEST BUY 00011", -12999),
    (8, "AMC THEATRES", -3400),
];

struct DemoRule {
    matcher: &'static str,
    category: &'static str,
    confidence: i64,
}

const RULES: &[DemoRule] = &[
    DemoRule { matcher: "PAYROLL%", category: "Income", confidence: 95 },
    DemoRule { matcher: "%WHOLE FOODS%", category: "Groceries", confidence: 80 },
    DemoRule { matcher: "%TRADER JOE%", category: "Groceries", confidence: 80 },
    DemoRule { matcher: "%UBER%", category: "Transport", confidence: 60 },
    DemoRule { matcher: "%UBER EATS%", category: "Dining", confidence: 90 },
    DemoRule { matcher: "SHELL OIL%", category: "Transport", confidence: 70 },
    DemoRule { matcher: "NETFLIX%", category: "Entertainment", confidence: 90 },
    DemoRule { matcher: "SPOTIFY%", category: "Entertainment", confidence: 90 },
];

/// Day `day` of the month starting at `first`, clamped to the month's end.
fn day_in_month(first: NaiveDate, day: u32) -> NaiveDate {
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first);
    first
        .checked_add_days(Days::new(u64::from(day.saturating_sub(1))))
        .map_or(last, |d| d.min(last))
}

fn first_of_month(today: NaiveDate, months_ago: u32) -> NaiveDate {
    let this_month = today - Days::new(u64::from(chrono::Datelike::day(&today) - 1));
    this_month
        .checked_sub_months(Months::new(months_ago))
        .unwrap_or(this_month)
}

/// Demo transactions up to and including `today`, oldest month first.
fn generate_transactions(today: NaiveDate) -> Vec<(NaiveDate, &'static str, i64)> {
    let mut txns = Vec::new();
    for i in 0..DEMO_MONTHS {
        let first = first_of_month(today, DEMO_MONTHS - 1 - i);
        let idx = i as usize;
        for &(day, description, cents) in MONTHLY {
            // Grocery bills drift a little month to month.
            let cents = if description.starts_with("WHOLE FOODS") {
                cents - (idx as i64 % 3) * 450
            } else {
                cents
            };
            txns.push((day_in_month(first, day), description, cents));
        }
        let (day, description, cents) = ROTATING[idx % ROTATING.len()];
        txns.push((day_in_month(first, day), description, cents));
    }
    txns.retain(|(date, _, _)| *date <= today);
    txns
}

struct DemoSummary {
    transactions: usize,
    categorized: usize,
    budgets: usize,
}

fn insert_demo_data(
    conn: &mut Connection,
    session: &Session,
    today: NaiveDate,
    horizon: NaiveDate,
) -> Result<DemoSummary> {
    for (name, color) in CATEGORIES {
        if crate::backend::categories::find_category_by_name(conn, session, name)?.is_none() {
            create_category(conn, session, name, color)?;
        }
    }

    let account_id = insert_account(conn, session, ACCOUNT_NAME, "checking")?;
    let txns = generate_transactions(today);
    for (date, description, cents) in &txns {
        insert_transaction(conn, session, account_id, *date, *cents, description)?;
    }

    for rule in RULES {
        create_rule(conn, session, rule.matcher, rule.category, rule.confidence)?;
    }
    let result = apply_rules(conn, session)?;

    let start = first_of_month(today, DEMO_MONTHS - 1);
    let budgets = [
        ("Groceries", 40000, RecurrenceType::Monthly, 1),
        ("Dining", 5000, RecurrenceType::Weekly, 2),
        ("Transport", 12000, RecurrenceType::Monthly, 1),
        ("Entertainment", 2500, RecurrenceType::Monthly, 1),
    ];
    for (category, amount_cents, recurrence_type, recurrence_interval) in budgets {
        let new = NewBudget {
            category: category.to_string(),
            name: None,
            amount_cents,
            start_date: start,
            recurrence_type,
            recurrence_interval,
            end_date: None,
        };
        create_budget(conn, session, &new, horizon)?;
    }

    Ok(DemoSummary {
        transactions: txns.len(),
        categorized: result.categorized,
        budgets: budgets.len(),
    })
}

pub fn run() -> Result<()> {
    let mut ctx = super::open()?;

    let exists: bool = ctx.conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE owner = ?1 AND name = ?2)",
        rusqlite::params![ctx.session.user_id, ACCOUNT_NAME],
        |r| r.get(0),
    )?;
    if exists {
        println!("Demo data already loaded (account '{ACCOUNT_NAME}' exists).");
        return Ok(());
    }

    let today = super::today();
    let horizon = ctx.horizon(today);
    let summary = insert_demo_data(&mut ctx.conn, &ctx.session, today, horizon)?;

    println!("Demo data loaded for {}!", ctx.session.user_id);
    println!("  Account:       {ACCOUNT_NAME}");
    println!("  Transactions:  {}", summary.transactions);
    println!("  Categorized:   {}", summary.categorized);
    println!("  Uncategorized: {}", summary.transactions - summary.categorized);
    println!("  Budgets:       {}", summary.budgets);
    println!();
    println!("Try: pocketbook transactions list --uncategorized");
    println!("     pocketbook report budgets");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::budgets::list_budgets;
    use crate::db::test_db;
    use crate::reports::budget_overview;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_day_in_month_clamps() {
        assert_eq!(day_in_month(d("2024-02-01"), 31), d("2024-02-29"));
        assert_eq!(day_in_month(d("2024-03-01"), 1), d("2024-03-01"));
        assert_eq!(first_of_month(d("2024-03-15"), 2), d("2024-01-01"));
    }

    #[test]
    fn test_generated_transactions_stop_at_today() {
        let today = d("2024-04-10");
        let txns = generate_transactions(today);
        assert!(txns.iter().all(|(date, _, _)| *date <= today));
        assert_eq!(txns.first().map(|t| t.0), Some(d("2024-01-01")));
    }

    #[test]
    fn test_demo_data_is_categorized_and_budgeted() {
        let (_dir, mut conn) = test_db();
        let s = Session::new("alice");
        let today = d("2024-04-20");
        let summary = insert_demo_data(&mut conn, &s, today, d("2025-04-20")).unwrap();

        // Every recurring merchant has a rule; only the rotating one-offs are left.
        assert_eq!(summary.transactions - summary.categorized, DEMO_MONTHS as usize);
        let dining: i64 = conn
            .query_row(
                "SELECT count(*) FROM transactions WHERE description LIKE 'UBER EATS%' AND category = 'Dining'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(dining, 7);

        assert_eq!(list_budgets(&conn, &s, true).unwrap().len(), 4);
        let overview = budget_overview(&conn, &s, today).unwrap();
        assert!(overview.total_spent_cents > 0);
        assert_eq!(overview.budgets.len(), 4);
    }
}
