use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

mod commands;

/// Manage the library catalog and admin registrations
#[derive(Debug, Parser)]
#[command(name = "catalog-cli", version, about)]
struct Cli {
    /// Log at the configured level instead of warnings only
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Catalog operations
    #[command(subcommand)]
    Books(BooksCommand),
    /// Admin user registrations
    #[command(subcommand)]
    Users(UsersCommand),
    /// Run the HTTP server
    Serve,
}

#[derive(Debug, Subcommand)]
enum BooksCommand {
    /// List books, optionally filtered
    List {
        /// Case-insensitive match on title, author, ISBN or genre
        #[arg(long, short)]
        query: Option<String>,
    },
    /// Show one book
    Show { isbn: String },
    /// Add a book, or add copies to an existing ISBN
    Add(AddArgs),
    /// Borrow one copy
    Borrow { isbn: String },
    /// Return one copy
    Return { isbn: String },
    /// Remove a book from the catalog
    Delete { isbn: String },
}

#[derive(Debug, Args)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long)]
    isbn: String,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    quantity: u32,
}

#[derive(Debug, Subcommand)]
enum UsersCommand {
    /// Append a registration to the log
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        id: String,
    },
    /// List every registration
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = catalog_kernel::settings::Settings::load()
        .with_context(|| "failed to load catalog settings")?;

    // Keep command output readable unless asked otherwise; the server always logs
    let mut telemetry = settings.telemetry.clone();
    if !cli.verbose && !matches!(cli.command, Command::Serve) {
        telemetry.filter = "warn".to_string();
    }
    catalog_telemetry::init(&telemetry)?;

    tracing::debug!(env = ?settings.environment, command = ?cli.command, "catalog-cli starting");

    match cli.command {
        Command::Books(command) => commands::books(command, &settings),
        Command::Users(command) => commands::users(command, &settings).await,
        Command::Serve => {
            catalog_app::run(&settings).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
