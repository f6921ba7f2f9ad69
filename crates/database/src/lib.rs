//! SQLite persistence for medication reminders.
//!
//! This crate stores elderly profiles with their medication plans, the family
//! codes that grant read access to them, the daily adherence ledger and the
//! caller-to-profile default bindings, using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{elderly, Database, PlanInput, SaveProfile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:care.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a profile with one plan
//!     let profile = elderly::save_profile(
//!         &db,
//!         &SaveProfile {
//!             name: "王阿姨".to_string(),
//!             plans: vec![PlanInput::new("降压药", 1, Some("片"), &["08:00", "20:00"])],
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!     println!("family code: {:?}", profile.family_code);
//!
//!     Ok(())
//! }
//! ```

pub mod elderly;
pub mod error;
pub mod family_code;
pub mod locks;
pub mod medication_record;
pub mod models;
pub mod user_settings;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use locks::KeyedLocks;
pub use models::{
    Elderly, ElderlyProfile, MedicationInput, MedicationPlan, MedicationRecord,
    PlanInput, RecordStatus, SaveProfile, UserSettings,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tokio::sync::OwnedMutexGuard;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    locks: KeyedLocks,
}

impl Database {
    /// Default pool size for database connections.
    pub const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/care.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self {
            pool,
            locks: KeyedLocks::new(),
        })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Serialize writers for one elderly profile.
    pub async fn lock_elderly(&self, elderly_id: i64) -> OwnedMutexGuard<()> {
        self.locks.lock(elderly_id).await
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
