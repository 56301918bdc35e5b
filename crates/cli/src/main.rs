//! Voltio CLI - Database migrations, seeding and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! voltio migrate
//!
//! # Load products and FAQs
//! voltio seed catalog seed/catalog.yaml
//! voltio seed faqs seed/faqs.yaml
//!
//! # Manage admin accounts
//! voltio admin create -e ana@voltio.mx -n "Ana López" -p 'a-long-passphrase'
//! voltio admin promote -e beto@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `VOLTIO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "voltio")]
#[command(author, version, about = "Voltio CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load data from YAML files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert or update products, matched by name
    Catalog {
        /// Path to the catalog YAML file
        file: PathBuf,
    },
    /// Insert FAQs, skipping questions that already exist
    Faqs {
        /// Path to the FAQ YAML file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Initial password (at least 8 characters)
        #[arg(short, long, env = "VOLTIO_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Give an existing account the admin role
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
            SeedTarget::Faqs { file } => commands::seed::faqs(&file).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => commands::admin::create(&email, &name, &password).await?,
            AdminAction::Promote { email } => commands::admin::promote(&email).await?,
        },
    }
    Ok(())
}
