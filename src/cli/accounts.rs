use comfy_table::{Cell, Table};

use crate::backend::accounts::list_accounts;
use crate::error::Result;

pub fn list() -> Result<()> {
    let ctx = super::open()?;
    let accounts = list_accounts(&ctx.conn, &ctx.session)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type"]);
    for acct in accounts {
        table.add_row(vec![
            Cell::new(acct.id),
            Cell::new(acct.name),
            Cell::new(acct.account_type),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
