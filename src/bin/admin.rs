//! CLI administration tool for url-alias.
//!
//! Inspects aliases and tokens offline, creates and resolves rows directly
//! against PostgreSQL, and performs database checks without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show the alias and offset-0 token a URL would get
//! cargo run --bin admin -- alias fingerprint https://ziglang.org/documentation/master/
//!
//! # Decode a token
//! cargo run --bin admin -- alias decode Pw0_dBc_Pz9YPxtOPz8_NzA~
//!
//! # Shorten a URL (prompts when omitted)
//! cargo run --bin admin -- url create
//!
//! # Show the row behind a token without counting a hit
//! cargo run --bin admin -- url show Pw0_dBc_Pz9YPxtOPz8_NzA~
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` components: required for `url`, `stats` and `db`

use url_alias::application::services::UrlService;
use url_alias::config::Config;
use url_alias::domain::entities::{Offset, ShortenedUrl};
use url_alias::domain::hit_queue::TelemetryQueue;
use url_alias::domain::repositories::ShortenedUrlRepository;
use url_alias::infrastructure::persistence::PgShortenedUrlRepository;
use url_alias::utils::{alias_codec, url_identity};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use sqlx::PgPool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// CLI tool for managing url-alias.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Offline alias and token tools
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },

    /// Create and inspect stored urls
    Url {
        #[command(subcommand)]
        action: UrlAction,
    },

    /// Show statistics
    Stats {
        /// Number of recent rows to list
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum AliasAction {
    /// Print the alias and offset-0 token of a URL
    Fingerprint { url: String },

    /// Decode a token into alias and offset
    Decode { token: String },
}

#[derive(Subcommand)]
enum UrlAction {
    /// Shorten a URL
    Create {
        /// URL to shorten (prompted for when omitted)
        url: Option<String>,
    },

    /// Show the row behind a token
    Show { token: String },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Alias { action } => handle_alias_action(action),
        Commands::Url { action } => handle_url_action(action, &connect().await?).await,
        Commands::Stats { limit } => handle_stats(&connect().await?, limit).await,
        Commands::Db { action } => handle_db_action(action, &connect().await?).await,
    }
}

async fn connect() -> Result<PgPool> {
    let database_url = Config::load_database_url()?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

fn handle_alias_action(action: AliasAction) -> Result<()> {
    match action {
        AliasAction::Fingerprint { url } => {
            let identity = url_identity::parse_identity(&url)?;
            let alias = alias_codec::fingerprint(&identity.content)?;

            println!("{}", "🔎 Fingerprint".bright_blue().bold());
            println!();
            println!("  Content: {}", identity.content.cyan());
            println!("  Alias:   {}", alias.to_hex().bright_white());
            println!(
                "  Token:   {} {}",
                alias_codec::encode(&alias, Offset::ZERO).bright_yellow().bold(),
                "(offset 0)".bright_black()
            );
        }
        AliasAction::Decode { token } => match alias_codec::decode(&token) {
            Ok((alias, offset)) => {
                println!("{}", "🔓 Decoded token".bright_blue().bold());
                println!();
                println!("  Alias:  {}", alias.to_hex().bright_white());
                println!("  Offset: {}", offset.to_string().bright_yellow());
            }
            Err(e) => {
                println!("{} {}", "❌ Invalid token:".red().bold(), e);
            }
        },
    }

    Ok(())
}

async fn handle_url_action(action: UrlAction, pool: &PgPool) -> Result<()> {
    let repo: Arc<dyn ShortenedUrlRepository> =
        Arc::new(PgShortenedUrlRepository::new(Arc::new(pool.clone())));
    // The CLI never records hits, so the queue has no consumer.
    let (queue, _rx) = TelemetryQueue::bounded(1);
    let service = UrlService::new(repo, queue);

    match action {
        UrlAction::Create { url } => {
            let url = match url {
                Some(u) => u,
                None => Input::new()
                    .with_prompt("URL to shorten")
                    .with_initial_text("https://")
                    .interact_text()?,
            };

            let row = service
                .create(&url, &CancellationToken::new())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to shorten url: {}", e))?;

            println!();
            println!("{}", "✅ Url shortened".green().bold());
            print_row(&row);
        }
        UrlAction::Show { token } => {
            let row = service
                .inspect(&token)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e.message()))?;

            print_row(&row);
        }
    }

    Ok(())
}

fn print_row(row: &ShortenedUrl) {
    println!();
    println!("  Row id:   {}", row.row_id.to_string().bright_black());
    println!("  Token:    {}", row.url_safe_alias.bright_yellow().bold());
    println!("  Url:      {}", row.full_url.cyan());
    println!("  Alias:    {}", row.alias.to_hex().bright_white());
    println!("  Offset:   {}", row.offset);
    println!(
        "  Created:  {}",
        row.created.format("%Y-%m-%d %H:%M:%S").to_string().bright_black()
    );
    println!("  Hits:     {}", row.hits.to_string().bright_green());
    match row.last_hit {
        Some(at) => println!("  Last hit: {}", at.format("%Y-%m-%d %H:%M:%S")),
        None => println!("  Last hit: {}", "never".bright_black()),
    }
    println!();
}

/// Displays row and hit totals plus the most recent rows.
async fn handle_stats(pool: &PgPool, limit: i64) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let repo = PgShortenedUrlRepository::new(Arc::new(pool.clone()));

    let rows_count = repo
        .count()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count rows: {}", e))?;

    let hits_total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(hits), 0)::BIGINT FROM shortened_urls")
        .fetch_one(pool)
        .await?;

    println!("  Urls: {}", rows_count.to_string().bright_green().bold());
    println!("  Hits: {}", hits_total.to_string().bright_green().bold());
    println!();

    let recent = repo
        .list(0, limit)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list rows: {}", e))?;

    if recent.is_empty() {
        return Ok(());
    }

    println!(
        "  {:<6} {:<26} {:<8} {}",
        "ID".bright_white().bold(),
        "Token".bright_white().bold(),
        "Hits".bright_white().bold(),
        "Url".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for row in &recent {
        println!(
            "  {:<6} {:<26} {:<8} {}",
            row.row_id.to_string().bright_black(),
            row.url_safe_alias.bright_yellow(),
            row.hits,
            row.full_url.cyan()
        );
    }
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
