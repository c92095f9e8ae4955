use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use prm_core::config::{data_file_from_env_value, pinned_date_from_env_value};
use prm_core::{CoreConfig, PatientRoster};

/// Main entry point for the PRM dashboard service
///
/// Loads the patient dataset once and serves the read-only REST API over it.
///
/// # Environment Variables
/// - `PRM_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PRM_DATA_FILE`: JSON or YAML dataset to load (default: "fixtures/patients.json")
/// - `PRM_TODAY`: Pin "today" to a YYYY-MM-DD date instead of the system clock
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, loading or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("prm=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("PRM_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_file = data_file_from_env_value(std::env::var("PRM_DATA_FILE").ok());
    let pinned_date = pinned_date_from_env_value(std::env::var("PRM_TODAY").ok())?;

    let cfg = CoreConfig::new(data_file, pinned_date)?;
    let roster = PatientRoster::from_config(&cfg)?;
    tracing::info!(
        "++ Loaded {} patients from {}",
        roster.patients().len(),
        cfg.data_file().display()
    );
    if let Some(date) = cfg.pinned_date() {
        tracing::info!("++ Today pinned to {}", date);
    }

    tracing::info!("++ Starting PRM REST on {}", rest_addr);

    let app = router(AppState::new(Arc::new(roster)));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
