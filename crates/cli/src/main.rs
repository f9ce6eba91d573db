//! Tidewear CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the schema and both session tables
//! tw-cli migrate
//!
//! # Create a verified admin account
//! tw-cli admin create -e ops@tidewear.shop -n "Ops" -p 'long random password'
//!
//! # Load brands, categories, colors and products
//! tw-cli seed catalog seed/catalog.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create or promote admin users
//! - `seed catalog` - Upsert catalog data from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tw-cli")]
#[command(author, version, about = "Tidewear CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations and create session tables
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Initial password (8-128 characters)
        #[arg(short, long)]
        password: String,

        /// Promote the account instead of failing when the email is taken
        #[arg(long)]
        promote: bool,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert brands, categories, colors and products from a YAML file
    Catalog {
        /// Path to the YAML document
        file: String,
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
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
                promote,
            } => {
                commands::admin::create_user(&email, &name, &password, promote).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
    }
    Ok(())
}
