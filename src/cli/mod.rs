pub mod accounts;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod categorize;
pub mod demo;
pub mod init;
pub mod report;
pub mod rules;
pub mod status;
pub mod transactions;

use chrono::{Local, Months, NaiveDate};
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::{get_connection, init_db};
use crate::error::{validation, PocketbookError, Result};
use crate::session::{require_session, Session};
use crate::settings::{load_settings, Settings};

/// What every data command works with: settings, the signed-in user and an
/// open database.
pub(crate) struct Context {
    pub settings: Settings,
    pub session: Session,
    pub conn: Connection,
}

impl Context {
    pub fn money(&self, cents: i64) -> String {
        crate::fmt::money(cents, &self.settings.currency_symbol)
    }

    /// Furthest date budget periods are laid out to.
    pub fn horizon(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_months(Months::new(self.settings.period_horizon_months))
            .unwrap_or(today)
    }
}

/// Refuses before touching the database when nobody is signed in.
pub(crate) fn open() -> Result<Context> {
    let settings = load_settings();
    let session = require_session(&settings)?;
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(PocketbookError::Other(format!(
            "Database not found at {}. Run `pocketbook init` first.",
            db_path.display()
        )));
    }
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    tracing::debug!(user = %session.user_id, db = %db_path.display(), "opened database");
    Ok(Context {
        settings,
        session,
        conn,
    })
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| validation(format!("bad date '{input}', expected YYYY-MM-DD")))
}

pub(crate) fn parse_date_opt(input: Option<&str>) -> Result<Option<NaiveDate>> {
    input.map(parse_date).transpose()
}

pub(crate) fn parse_cents(input: &str) -> Result<i64> {
    crate::fmt::parse_amount(input).ok_or_else(|| validation(format!("bad amount '{input}'")))
}

#[derive(Parser)]
#[command(name = "pocketbook", about = "Personal finance: categorize spending and track budgets.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for pocketbook data (default: ~/Documents/pocketbook)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Sign in as a user; all data commands act on their records.
    Login {
        user: String,
    },
    /// Sign out.
    Logout,
    /// Show the current user, database and summary counts.
    Status,
    /// Load sample accounts, transactions, rules and budgets for the current user.
    Demo,
    /// List accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Manage categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Run the rules over uncategorized transactions.
    Categorize,
    /// Browse and categorize transactions.
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
    /// Manage budgets.
    Budgets {
        #[command(subcommand)]
        command: BudgetsCommands,
    },
    /// Spending and budget reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// List all accounts.
    List,
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category.
    Add {
        name: String,
        /// Display color: red, orange, yellow, green, blue, indigo, purple, pink, gray, cyan
        #[arg(long, default_value = "gray")]
        color: String,
    },
    /// List all categories.
    List,
    /// Rename or recolor a category.
    Update {
        /// Category ID (shown in `pocketbook categories list`)
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a category.
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a categorization rule.
    Add {
        /// Pattern; `%` matches any run of characters, e.g. '%UBER%'
        matcher: String,
        /// Category name to assign
        #[arg(long)]
        category: String,
        /// 0-100; the highest matching rule wins
        #[arg(long, default_value_t = crate::backend::rules::DEFAULT_CONFIDENCE)]
        confidence: i64,
    },
    /// List all rules.
    List,
    /// Update an existing rule.
    Update {
        /// Rule ID (shown in `pocketbook rules list`)
        id: i64,
        #[arg(long)]
        matcher: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        confidence: Option<i64>,
    },
    /// Delete a rule.
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// List transactions, newest first.
    List {
        /// Case-insensitive text to look for in the description
        #[arg(long)]
        search: Option<String>,
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Only uncategorized or flagged transactions
        #[arg(long)]
        uncategorized: bool,
        #[arg(long, default_value_t = crate::backend::transactions::DEFAULT_PAGE_SIZE)]
        limit: usize,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Set a transaction's category by hand.
    SetCategory {
        id: i64,
        category: String,
    },
    /// Create a rule from a transaction and categorize it in one step.
    QuickRule {
        id: i64,
        #[arg(long)]
        category: String,
        /// Text the rule looks for (default: suggested from the description)
        #[arg(long)]
        text: Option<String>,
        #[arg(long, default_value_t = crate::categorizer::QUICK_RULE_CONFIDENCE)]
        confidence: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetsCommands {
    /// Add a budget for a category.
    Add {
        /// Category name
        category: String,
        /// Amount per period, e.g. 400 or 400.00
        #[arg(long)]
        amount: String,
        /// Budget name (default: the category name)
        #[arg(long)]
        name: Option<String>,
        /// First day of the first period: YYYY-MM-DD (default: today)
        #[arg(long)]
        start: Option<String>,
        /// daily, weekly, monthly or yearly
        #[arg(long, default_value = "monthly")]
        every: String,
        #[arg(long, default_value_t = 1)]
        interval: u32,
        /// Last day covered: YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
    },
    /// List budgets with their current period.
    List {
        /// Include inactive budgets
        #[arg(long)]
        all: bool,
    },
    /// Show a budget's current period and history.
    Show {
        id: i64,
    },
    /// Update a budget.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        every: Option<String>,
        #[arg(long)]
        interval: Option<u32>,
        #[arg(long, conflicts_with = "no_end")]
        end: Option<String>,
        /// Remove the end date
        #[arg(long = "no-end")]
        no_end: bool,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a budget and its periods.
    Delete {
        id: i64,
    },
    /// Extend periods to the horizon and recompute spending.
    Refresh,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Spending by category.
    Spending {
        /// Start date: YYYY-MM-DD (default: first of this month)
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD (default: today)
        #[arg(long = "to")]
        to_date: Option<String>,
    },
    /// Spending per month.
    Monthly {
        #[arg(long, default_value_t = 6)]
        months: u32,
    },
    /// Current period and history of every active budget.
    Budgets,
}
