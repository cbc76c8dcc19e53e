use crate::categorizer::apply_rules;
use crate::error::Result;

pub fn run() -> Result<()> {
    let ctx = super::open()?;
    let result = apply_rules(&ctx.conn, &ctx.session)?;
    println!(
        "{} categorized, {} still uncategorized",
        result.categorized, result.still_uncategorized
    );
    Ok(())
}
