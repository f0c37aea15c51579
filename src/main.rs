mod cli;
mod config;
mod error;
mod geoip;
mod ingest;
mod logging;
mod server;
mod storage;

use anyhow::Result;
use cli::Commands;
use storage::retention;
use tracing::info;

/// Single-operator deployment: server rows belong to the default owner.
/// The multi-user dashboard in front of this API manages its own accounts.
const DEFAULT_OWNER_ID: i64 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();

    logging::init(&cli)?;

    match cli.command.clone() {
        Some(Commands::Version) => {
            println!("hostwatch v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }

        Some(Commands::Validate { config }) => {
            let path = config.unwrap_or_else(|| cli.config.clone());
            config::load(&path)?;
            println!("Configuration OK: {}", path.display());
            Ok(())
        }

        Some(Commands::AddServer { name, hostname }) => {
            let config = config::load(&cli.config)?;
            let db = storage::init(&config)?;

            let (plain, hashed) = server::auth::generate_token();
            let created = db.insert_server(DEFAULT_OWNER_ID, &name, hostname.as_deref(), &hashed)?;
            if !db.has_thresholds(DEFAULT_OWNER_ID)? {
                db.seed_default_thresholds(DEFAULT_OWNER_ID)?;
            }

            println!("Server '{}' registered (id {})", created.name, created.id);
            println!("Agent token (shown once, store it now):");
            println!("  {}", plain);
            Ok(())
        }

        Some(Commands::RotateToken { id }) => {
            let config = config::load(&cli.config)?;
            let db = storage::init(&config)?;

            let (plain, hashed) = server::auth::generate_token();
            if !db.update_server_token(id, &hashed)? {
                eprintln!("No server with id {}", id);
                std::process::exit(1);
            }

            println!("Token rotated for server {}", id);
            println!("New agent token (shown once, store it now):");
            println!("  {}", plain);
            Ok(())
        }

        Some(Commands::Prune {
            metric_days,
            ban_days,
        }) => {
            let config = config::load(&cli.config)?;
            let db = storage::init(&config)?;

            let metric_days = metric_days
                .unwrap_or_else(|| retention::parse_retention_days(&config.storage.retention.metrics));
            let ban_days = ban_days.unwrap_or_else(|| {
                retention::parse_retention_days(&config.storage.retention.ban_events)
            });

            let (metrics_deleted, bans_deleted) = retention::run_prune(&db, metric_days, ban_days)?;
            println!(
                "Pruned {} metrics (> {}d) and {} ban events (> {}d)",
                metrics_deleted, metric_days, bans_deleted, ban_days
            );
            Ok(())
        }

        Some(Commands::Run) | None => {
            info!(version = env!("CARGO_PKG_VERSION"), "Starting hostwatch");

            let config = config::load(&cli.config)?;
            server::run(config).await
        }
    }
}
