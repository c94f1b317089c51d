//! # LowLow Store Entry Point
//!
//! Opens (or creates) the store, seeds the default accounts, optionally
//! moves data in or out of a browser storage dump, and logs a summary.
//!
//! ## Usage
//! ```bash
//! # Platform data folder, or LOWLOW_DB_PATH
//! cargo run -p lowlow-marketplace
//!
//! # Import a dump saved from the old front end
//! cargo run -p lowlow-marketplace -- --db ./lowlow.db --import localStorage.json
//!
//! # Export the store in the same key namespace
//! cargo run -p lowlow-marketplace -- --export backup.json
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration (environment, then `--db`)
//! 3. Connect to database & run migrations
//! 4. Seed default accounts, restore the saved session
//! 5. Import, then export, if asked
//! 6. Log a summary

use std::env;
use std::path::PathBuf;

use tracing::info;

use lowlow_db::legacy::{parse_dump, render_dump};
use lowlow_marketplace::{init_tracing, ConfigState, MarketContext};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut import: Option<PathBuf> = None;
    let mut export: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--import" | "-i" => {
                if i + 1 < args.len() {
                    import = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--export" | "-e" => {
                if i + 1 < args.len() {
                    export = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("LowLow Store");
                println!();
                println!("Usage: lowlow [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file (default: LOWLOW_DB_PATH or data folder)");
                println!("  -i, --import <FILE>    Import a browser storage dump (JSON object)");
                println!("  -e, --export <FILE>    Write the store as a browser storage dump");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    let mut config = ConfigState::from_env();
    if db_path.is_some() {
        config.database_path = db_path;
    }
    info!(market = %config.market_name, "Starting LowLow store");

    let ctx = MarketContext::open(config).await?;
    let report = ctx.initialize().await?;
    info!(
        admins_added = report.admins_added,
        demo_company_added = report.demo_company_added,
        "Store ready"
    );

    if let Some(path) = import {
        let text = std::fs::read_to_string(&path)?;
        let snapshot = parse_dump(&text)?;
        let report = ctx.import_snapshot(&snapshot).await?;
        info!(
            file = %path.display(),
            users = report.users,
            products = report.products,
            cards = report.cards,
            orders = report.orders,
            requests = report.requests,
            skipped = report.skipped,
            "Dump imported"
        );
    }

    if let Some(path) = export {
        let snapshot = ctx.export_snapshot().await?;
        std::fs::write(&path, render_dump(&snapshot)?)?;
        info!(file = %path.display(), keys = snapshot.len(), "Dump exported");
    }

    let db = ctx.db();
    let (users, products, orders) = (
        db.users().count().await?,
        db.products().count().await?,
        db.orders().count().await?,
    );
    let session = ctx.current_user().map(|u| u.email);
    info!(
        market = %ctx.config().market_name,
        users,
        products,
        orders,
        session = session.as_deref().unwrap_or("-"),
        "Summary"
    );

    db.close().await;
    Ok(())
}
