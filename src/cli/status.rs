use crate::db::get_connection;
use crate::error::Result;
use crate::settings::{load_settings, settings_file_exists};

pub fn run() -> Result<()> {
    if !settings_file_exists() {
        println!("Not set up yet. Run `pocketbook init` to get started.");
        return Ok(());
    }
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("User:       {}", settings.user.as_deref().unwrap_or("(not signed in)"));
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `pocketbook init` to set up.");
        return Ok(());
    }
    let Some(user) = settings.user.as_deref() else {
        return Ok(());
    };

    let conn = get_connection(&db_path)?;
    let count = |sql: &str| -> Result<i64> { Ok(conn.query_row(sql, [user], |r| r.get(0))?) };
    let accounts = count("SELECT count(*) FROM accounts WHERE owner = ?1")?;
    let transactions = count(
        "SELECT count(*) FROM transactions t JOIN accounts a ON t.account_id = a.id WHERE a.owner = ?1",
    )?;
    let uncategorized = count(
        "SELECT count(*) FROM transactions t JOIN accounts a ON t.account_id = a.id \
         WHERE a.owner = ?1 AND (t.category IS NULL OR t.needs_review = 1)",
    )?;
    let categories = count("SELECT count(*) FROM categories WHERE owner = ?1")?;
    let rules = count("SELECT count(*) FROM rules WHERE owner = ?1")?;
    let budgets = count("SELECT count(*) FROM budgets WHERE owner = ?1 AND is_active = 1")?;

    println!();
    println!("Accounts:       {accounts}");
    println!("Transactions:   {transactions}");
    println!("Uncategorized:  {uncategorized}");
    println!("Categories:     {categories}");
    println!("Rules:          {rules}");
    println!("Budgets:        {budgets}");
    Ok(())
}
