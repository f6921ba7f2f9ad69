//! Medication reminder service.
//!
//! Serves the JSON API families use to configure an elderly person's
//! medication plan, share it through a family code and record daily
//! check-ins.

mod caller;
mod config;
mod error;
mod routes;
mod state;

use database::Database;
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting care web server");

    // Connect to database
    let db = Database::connect_with_pool_size(&config.database_url, config.pool_size).await?;
    db.migrate().await?;

    // Build application state
    let state = AppState::new(db);

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "Care web server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
