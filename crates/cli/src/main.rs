//! Bikeshop CLI - Database migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (schema + session table)
//! bikeshop-cli migrate
//!
//! # Import or update products from a CSV file
//! bikeshop-cli import-products parts.csv
//!
//! # Load the sample bike parts catalog
//! bikeshop-cli load-sample-data
//!
//! # Create a staff user (password from BIKESHOP_USER_PASSWORD)
//! bikeshop-cli user create -u mechanic --staff
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bikeshop-cli")]
#[command(author, version, about = "Bikeshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Import products from a CSV with columns name,brand,category,price,image_url
    ImportProducts {
        /// Path to the CSV file
        csv_path: PathBuf,
    },
    /// Load bike parts across several brands (placeholder images)
    LoadSampleData,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user; the password is read from BIKESHOP_USER_PASSWORD
    Create {
        #[arg(short, long)]
        username: String,

        /// Allow the user to delete products from the catalog
        #[arg(long)]
        staff: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::ImportProducts { csv_path } => {
            commands::import::products(&csv_path).await?;
        }
        Commands::LoadSampleData => {
            commands::sample::load().await?;
        }
        Commands::User { action } => match action {
            UserAction::Create { username, staff } => {
                commands::user::create(&username, staff).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "bikeshop-cli",
            "user",
            "create",
            "-u",
            "mechanic",
            "--staff",
        ])
        .map_err(|e| e.to_string());
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::Create { ref username, staff: true }
            }) if username == "mechanic"
        ));
    }

    #[test]
    fn test_parse_import_products() {
        let cli = Cli::try_parse_from(["bikeshop-cli", "import-products", "parts.csv"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::ImportProducts { csv_path }) if csv_path == PathBuf::from("parts.csv")
        ));
    }
}
