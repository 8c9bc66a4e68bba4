//! adms-dm (Dashboard Metrics) - Admissions admin dashboard cache service
//!
//! Hydrates the dashboard caches from the admissions database at startup,
//! then keeps them consistent from the row-change feed and serves them over
//! HTTP.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use adms_common::config::{database_path, ensure_root_folder, resolve_root_folder};
use adms_common::events::ChangeFeed;
use adms_dm::cache::DashboardCache;
use adms_dm::subscription::SubscriptionManager;
use adms_dm::{build_router, db, AppState};

#[derive(Parser, Debug)]
#[command(name = "adms-dm", about = "Admissions dashboard metrics service")]
struct Args {
    /// Root folder holding the admissions database
    #[arg(long)]
    root_folder: Option<String>,

    /// HTTP listen port
    #[arg(long, env = "ADMS_DM_PORT", default_value_t = 5780)]
    port: u16,

    /// Change feed channel name
    #[arg(long, default_value = "applications")]
    channel: String,

    /// Admin user id consulted by ownership-filtered queries
    #[arg(long, env = "ADMS_DM_ADMIN_USER")]
    admin_user: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Admissions Dashboard Metrics (adms-dm) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), "ADMS_ROOT_FOLDER");
    ensure_root_folder(&root_folder)?;

    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = match db::connect_readonly(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database (read-only)");
            pool
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    let total = db::count_applications(&pool).await?;
    let rows = db::fetch_applications(&pool).await?;
    info!("Loaded {} of {} applications for cache hydration", rows.len(), total);

    let cache = DashboardCache::new(args.admin_user.clone());
    cache.hydrate(rows, Utc::now()).await;

    let feed = ChangeFeed::new(args.channel.clone(), 1000);
    let mut subscription = SubscriptionManager::new(cache.clone(), 256);
    subscription.start(&feed).await;

    let state = AppState::new(cache, feed, Arc::new(RwLock::new(subscription)));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("adms-dm listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
