mod backend;
mod categorizer;
mod cli;
mod db;
mod error;
mod fmt;
mod logging;
mod matcher;
mod models;
mod periods;
mod reports;
mod session;
mod settings;

use clap::Parser;

use cli::{
    AccountsCommands, BudgetsCommands, CategoriesCommands, Cli, Commands, ReportCommands, RulesCommands,
    TransactionsCommands,
};

fn main() {
    logging::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Login { user } => cli::auth::login(&user),
        Commands::Logout => cli::auth::logout(),
        Commands::Status => cli::status::run(),
        Commands::Demo => cli::demo::run(),
        Commands::Accounts { command } => match command {
            AccountsCommands::List => cli::accounts::list(),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { name, color } => cli::categories::add(&name, &color),
            CategoriesCommands::List => cli::categories::list(),
            CategoriesCommands::Update { id, name, color } => {
                cli::categories::update(id, name.as_deref(), color.as_deref())
            }
            CategoriesCommands::Delete { id } => cli::categories::delete(id),
        },
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                matcher,
                category,
                confidence,
            } => cli::rules::add(&matcher, &category, confidence),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Update {
                id,
                matcher,
                category,
                confidence,
            } => cli::rules::update(id, matcher.as_deref(), category.as_deref(), confidence),
            RulesCommands::Delete { id } => cli::rules::delete(id),
        },
        Commands::Categorize => cli::categorize::run(),
        Commands::Transactions { command } => match command {
            TransactionsCommands::List {
                search,
                from_date,
                to_date,
                uncategorized,
                limit,
                page,
            } => cli::transactions::list(
                search,
                from_date.as_deref(),
                to_date.as_deref(),
                uncategorized,
                limit,
                page,
            ),
            TransactionsCommands::SetCategory { id, category } => cli::transactions::set_category(id, &category),
            TransactionsCommands::QuickRule {
                id,
                category,
                text,
                confidence,
            } => cli::transactions::quick_rule(id, &category, text.as_deref(), confidence),
        },
        Commands::Budgets { command } => match command {
            BudgetsCommands::Add {
                category,
                amount,
                name,
                start,
                every,
                interval,
                end,
            } => cli::budgets::add(&category, &amount, name, start.as_deref(), &every, interval, end.as_deref()),
            BudgetsCommands::List { all } => cli::budgets::list(all),
            BudgetsCommands::Show { id } => cli::budgets::show(id),
            BudgetsCommands::Update {
                id,
                name,
                amount,
                start,
                every,
                interval,
                end,
                no_end,
                active,
            } => cli::budgets::update(
                id,
                name,
                amount.as_deref(),
                start.as_deref(),
                every.as_deref(),
                interval,
                end.as_deref(),
                no_end,
                active,
            ),
            BudgetsCommands::Delete { id } => cli::budgets::delete(id),
            BudgetsCommands::Refresh => cli::budgets::refresh(),
        },
        Commands::Report { command } => match command {
            ReportCommands::Spending { from_date, to_date } => {
                cli::report::spending(from_date.as_deref(), to_date.as_deref())
            }
            ReportCommands::Monthly { months } => cli::report::monthly(months),
            ReportCommands::Budgets => cli::report::budgets(),
        },
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
