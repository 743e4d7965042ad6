// ============================================================================
// shoplist - terminal front-end for the monthly shopping list
// ============================================================================
// Usage:
//   shoplist shell                        Interactive session (login, template,
//                                         month builder, purchase)
//   shoplist status                       Saved session, theme and active list
//   shoplist export --format json         Active list of the saved session
//   shoplist theme <dark|light|toggle>    Set the theme flag
//   shoplist logout                       Forget the saved session
// ============================================================================

mod shell;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use shoplist_core::db::{self, KeyValueStore};
use shoplist_core::{AppConfig, ShoplistDb};
use tracing::warn;

/// Monthly shopping list manager
#[derive(Parser)]
#[command(name = "shoplist", version, about = "Plan and track your monthly shopping list")]
struct Cli {
    /// Path to the state database (default: ~/.shoplist/state.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    /// Webhook base URL of the automation backend
    #[arg(long, global = true)]
    webhook_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Shell,

    /// Show the saved session, theme and active list summary
    Status,

    /// Export the active list of the saved session
    Export {
        /// Output format (currently only json is supported)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Set the theme flag
    Theme {
        #[arg(value_enum)]
        mode: ThemeMode,
    },

    /// Forget the saved session (the saved list is kept)
    Logout,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeMode {
    Dark,
    Light,
    Toggle,
}

fn init_logging() {
    // Logs go to stderr so screens on stdout stay readable
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
        .add_directive("shoplist_core=info".parse().expect("static directive"))
        .add_directive("shoplist_cli=info".parse().expect("static directive"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }
    init_logging();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(path) = cli.db_path {
        config.db_path = Some(path);
    }
    if let Some(url) = cli.webhook_url {
        config.webhook_base_url = url;
    }

    let db = ShoplistDb::open(config.db_path.as_deref())?;

    match cli.command {
        Commands::Shell => shell::run(db, &config).await,
        Commands::Status => cmd_status(&db),
        Commands::Export { format } => cmd_export(&db, &format),
        Commands::Theme { mode } => cmd_theme(&db, mode),
        Commands::Logout => cmd_logout(&db),
    }
}

fn cmd_status(db: &ShoplistDb) -> Result<()> {
    println!("=== Shoplist Status ===");
    println!("Database: {}", db.path().display());
    println!(
        "Theme:    {}",
        if db::load_dark_mode(db)? { "dark" } else { "light" }
    );

    let Some(session) = db::load_session(db)? else {
        println!("Session:  none (run `shoplist shell` to log in)");
        return Ok(());
    };
    println!("Session:  {} ({})", session.email, session.user_id);

    match db::load_active_list(db, &session.user_id)? {
        Some(list) => {
            let total: f64 = list
                .categories
                .values()
                .flatten()
                .filter(|item| item.purchased)
                .map(|item| item.price)
                .sum();
            println!("List:     {}", list.reference_month);
            println!(
                "  {} items in {} categories, {} purchased, total R$ {:.2}",
                list.item_count(),
                list.categories.len(),
                list.purchased_count(),
                total
            );
        }
        None => println!("List:     none"),
    }

    Ok(())
}

fn cmd_export(db: &ShoplistDb, format: &str) -> Result<()> {
    if format != "json" {
        anyhow::bail!("Unsupported format '{}'. Only 'json' is supported.", format);
    }

    let session = db::load_session(db)?
        .ok_or_else(|| anyhow::anyhow!("No saved session. Log in with `shoplist shell` first."))?;
    let list = db::load_active_list(db, &session.user_id)?;

    let export = serde_json::json!({
        "user_id": session.user_id,
        "email": session.email,
        "reference_month": list.as_ref().map(|l| l.reference_month.as_str()),
        "list": list.as_ref().map(|l| &l.categories),
    });

    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

fn cmd_theme(db: &ShoplistDb, mode: ThemeMode) -> Result<()> {
    let dark = match mode {
        ThemeMode::Dark => true,
        ThemeMode::Light => false,
        ThemeMode::Toggle => !db::load_dark_mode(db)?,
    };
    db::save_dark_mode(db, dark)?;
    println!("Theme set to {}", if dark { "dark" } else { "light" });
    Ok(())
}

fn cmd_logout(db: &ShoplistDb) -> Result<()> {
    match db::load_session(db)? {
        Some(session) => {
            db::clear_session(db)?;
            println!("Logged out {}", session.email);
        }
        None => {
            warn!("No saved session found");
            println!("No saved session.");
        }
    }
    // Keys that remain: theme flag and per-user lists
    let remaining = db.keys()?.len();
    println!("{} saved entries kept", remaining);
    Ok(())
}
