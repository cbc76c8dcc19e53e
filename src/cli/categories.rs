use colored::{ColoredString, Colorize};
use comfy_table::{Cell, Table};

use crate::backend::categories::{create_category, delete_category, list_categories, update_category};
use crate::error::Result;

/// The category's name painted in its palette color.
pub(crate) fn swatch(text: &str, color: &str) -> ColoredString {
    match color {
        "red" => text.red(),
        "orange" => text.truecolor(255, 165, 0),
        "yellow" => text.yellow(),
        "green" => text.green(),
        "blue" => text.blue(),
        "indigo" => text.truecolor(75, 0, 130),
        "purple" => text.purple(),
        "pink" => text.truecolor(255, 105, 180),
        "cyan" => text.cyan(),
        _ => text.dimmed(),
    }
}

pub fn add(name: &str, color: &str) -> Result<()> {
    let ctx = super::open()?;
    let category = create_category(&ctx.conn, &ctx.session, name, color)?;
    println!("Added category {}: {}", category.id, swatch(&category.name, &category.color));
    Ok(())
}

pub fn list() -> Result<()> {
    let ctx = super::open()?;
    let categories = list_categories(&ctx.conn, &ctx.session)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Color"]);
    for cat in categories {
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(swatch(&cat.color, &cat.color)),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn update(id: i64, name: Option<&str>, color: Option<&str>) -> Result<()> {
    let mut ctx = super::open()?;
    let category = update_category(&mut ctx.conn, &ctx.session, id, name, color)?;
    println!("Updated category {id}: {}", swatch(&category.name, &category.color));
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let ctx = super::open()?;
    delete_category(&ctx.conn, &ctx.session, id)?;
    println!("Deleted category {id}");
    Ok(())
}
