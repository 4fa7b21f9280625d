//! `TakafulLedger` service binary.
//!
//! Initializes the store, seeds the administrator account and any configured
//! groups, then runs the recurring-contribution sweep on a timer. All request
//! handling (web/API) lives in external collaborators that call into the
//! library; this process only owns the background obligations job.

use std::{env, time::Duration};
use takaful_ledger::{
    config::{self, settings::AppConfig},
    core::{group, scheduler, user},
    errors::{Error, Result},
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenvy::dotenv().ok();

    // 3. Load runtime settings
    let settings = AppConfig::from_env()
        .inspect_err(|e| error!("Failed to load settings: {e}"))?;
    info!(
        commission_rate = settings.commission_rate,
        sweep_interval_secs = settings.sweep_interval_secs,
        "Loaded application settings"
    );

    // 4. Initialize database
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database connection established"))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db).await?;

    // 5. Seed the administrator account (explicit bootstrap step)
    let admin_name = env::var("TAKAFUL_ADMIN_NAME").unwrap_or_else(|_| "admin".to_string());
    let admin_email =
        env::var("TAKAFUL_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let admin_hash = env::var("TAKAFUL_ADMIN_PASSWORD_HASH")
        .inspect_err(|_| error!("TAKAFUL_ADMIN_PASSWORD_HASH not set"))
        .map_err(Error::EnvVar)?;
    let admin = user::seed_admin(&db, &admin_name, &admin_email, &admin_hash).await?;
    info!(admin = %admin.name, "Administrator account ready");

    // 6. Seed groups from config.toml (if present)
    let seed = config::groups::load_default_config()?;
    for entry in seed.groups {
        let monthly = entry
            .monthly_contribution
            .unwrap_or(settings.monthly_contribution);
        match group::create_group(&db, &entry.name, entry.description, monthly, admin.id).await {
            Ok(created) => info!(group = %created.name, "Seeded group"),
            Err(Error::DuplicateName { name }) => debug!(group = %name, "Group already exists"),
            Err(e) => return Err(e),
        }
    }

    // 7. Run the contribution sweep forever
    scheduler::run_sweep_loop(&db, Duration::from_secs(settings.sweep_interval_secs)).await;

    Ok(())
}
