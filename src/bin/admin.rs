//! CLI administration tool for the shortener.
//!
//! Provides commands for generating signing keys, managing accounts and
//! checking the database without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Generate an Ed25519 signing key pair into ./keys
//! cargo run --bin admin -- keys generate --out keys
//!
//! # Create an administrator account
//! cargo run --bin admin -- user create --admin
//!
//! # Grant the admin role to an existing account
//! cargo run --bin admin -- user promote 3f1c...-...
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` components: required by `user` and `db` commands
//! - `BCRYPT_COST`: password hash cost for `user create` (default: 12)

use shortener::application::services::UserService;
use shortener::config::Config;
use shortener::domain::entities::Role;
use shortener::infrastructure::keys::{PUBLIC_KEY_SUFFIX, generate_ed25519_keypair};
use shortener::infrastructure::persistence::PgUserRepository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use sqlx::PgPool;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI tool for managing the shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage token signing keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// Generate an Ed25519 key pair named after its key id
    Generate {
        /// Directory receiving `<kid>.pem` and `<kid>.pub.pem`
        #[arg(short, long, default_value = "keys")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account (prompts for missing values)
    Create {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(short = 'n', long)]
        full_name: Option<String>,

        /// Grant the admin role as well
        #[arg(long)]
        admin: bool,
    },

    /// Grant the admin role to an existing account
    Promote {
        /// Account id (UUID)
        id: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keys { action } => handle_keys_action(action).await?,
        Commands::User { action } => {
            let pool = connect().await?;
            handle_user_action(action, pool).await?;
        }
        Commands::Db { action } => {
            let pool = connect().await?;
            handle_db_action(action, &pool).await?;
        }
    }

    Ok(())
}

async fn connect() -> Result<PgPool> {
    let database_url = Config::load_database_url()?
        .context("DATABASE_URL (or DB_USER/DB_NAME) must be set")?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

async fn handle_keys_action(action: KeysAction) -> Result<()> {
    match action {
        KeysAction::Generate { out } => generate_keys(out).await,
    }
}

/// Writes a fresh key pair and prints the settings that activate it.
///
/// Older `*.pub.pem` files in the directory are left alone, so tokens signed
/// with the previous key keep verifying until the file is removed.
async fn generate_keys(out: PathBuf) -> Result<()> {
    println!("{}", "🔑 Generate signing key".bright_blue().bold());
    println!();

    let pair = generate_ed25519_keypair()?;

    tokio::fs::create_dir_all(&out)
        .await
        .with_context(|| format!("Failed to create {}", out.display()))?;

    let private_path = out.join(format!("{}.pem", pair.kid));
    let public_path = out.join(format!("{}{}", pair.kid, PUBLIC_KEY_SUFFIX));

    tokio::fs::write(&private_path, pair.private_pem.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", private_path.display()))?;
    tokio::fs::write(&public_path, pair.public_pem.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", public_path.display()))?;

    println!("  Key id:      {}", pair.kid.bright_yellow().bold());
    println!("  Private key: {}", private_path.display().to_string().cyan());
    println!("  Public key:  {}", public_path.display().to_string().cyan());
    println!();
    println!(
        "{}",
        "⚠️  Keep the private key secret. Only the .pub.pem file belongs in the shared key directory."
            .red()
            .bold()
    );
    println!();
    println!("{}", "Activate it with:".bright_white());
    println!("  JWT_PRIVATE_KEY_PATH={}", private_path.display());
    println!("  JWT_ACTIVE_KID={}", pair.kid);
    println!("  JWT_PUBLIC_KEYS_DIR={}", out.display());
    println!();

    Ok(())
}

async fn handle_user_action(action: UserAction, pool: PgPool) -> Result<()> {
    let bcrypt_cost = std::env::var("BCRYPT_COST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(bcrypt::DEFAULT_COST);

    let service = UserService::new(Arc::new(PgUserRepository::new(Arc::new(pool))))
        .with_bcrypt_cost(bcrypt_cost);

    match action {
        UserAction::Create {
            email,
            full_name,
            admin,
        } => create_user(&service, email, full_name, admin).await,
        UserAction::Promote { id, yes } => promote_user(&service, id, yes).await,
    }
}

async fn create_user(
    service: &UserService<PgUserRepository>,
    email: Option<String>,
    full_name: Option<String>,
    admin: bool,
) -> Result<()> {
    println!("{}", "👤 Create account".bright_blue().bold());
    println!();

    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };

    let full_name = match full_name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Full name")
            .allow_empty(true)
            .interact_text()?,
    };

    let password = Password::new()
        .with_prompt("Password (8-30 characters)")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let mut roles = BTreeSet::from([Role::User]);
    if admin {
        roles.insert(Role::Admin);
    }

    let user = service
        .create_user(email, full_name, password, roles)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create account: {}", e))?;

    println!();
    println!("{}", "✅ Account created".green().bold());
    println!("  Id:    {}", user.id.to_string().bright_yellow());
    println!("  Email: {}", user.email.cyan());
    println!("  Roles: {}", format_roles(&user.roles));
    println!();

    Ok(())
}

async fn promote_user(
    service: &UserService<PgUserRepository>,
    id: String,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🛡️  Promote account".bright_blue().bold());
    println!();

    let user = service
        .get_by_id(&id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load account: {}", e))?;

    if user.roles.contains(&Role::Admin) {
        println!("{}", "⚠️  This account is already an administrator".yellow());
        return Ok(());
    }

    println!("  Account: {} ({})", user.email.cyan(), user.id.to_string().bright_black());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Grant the admin role?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let user = service
        .grant_role(&id, Role::Admin)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to promote account: {}", e))?;

    println!();
    println!("{}", "✅ Role granted".green().bold());
    println!("  Roles: {}", format_roles(&user.roles));
    println!();

    Ok(())
}

fn format_roles(roles: &BTreeSet<Role>) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").execute(pool).await?;

            let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(pool)
                .await?;
            let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
                .fetch_one(pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  Users: {}", users.to_string().bright_white());
            println!("  Links: {}", links.to_string().bright_white());
        }
    }

    Ok(())
}
