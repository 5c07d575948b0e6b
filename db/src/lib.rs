use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgSslMode},
};
use std::{str::FromStr, sync::Arc};

pub mod appeal;
pub mod entitlement;
pub mod memory;
pub mod payment;
pub mod store;

pub use memory::MemoryStore;
pub use store::{PgStore, Store};

pub mod models {
    pub mod appeal;
    pub mod entitlement;
    pub mod payment;

    /// A stored enum column held a value this build does not know.
    #[derive(Debug, thiserror::Error)]
    #[error("Unknown {kind}: {value}")]
    pub struct UnknownVariant {
        pub kind: &'static str,
        pub value: String,
    }

    impl UnknownVariant {
        pub fn new(kind: &'static str, value: &str) -> Self {
            UnknownVariant {
                kind,
                value: value.to_string(),
            }
        }
    }

    impl From<UnknownVariant> for common::error::AppError {
        fn from(err: UnknownVariant) -> Self {
            common::error::AppError::Internal(err.to_string())
        }
    }
}

pub mod dtos {
    pub mod appeal;
    pub mod entitlement;
    pub mod payment;
}

/// Creates the database if it does not exist yet, runs migrations and
/// returns a store bound to the pool.
pub async fn setup(
    database_url: &str,
    require_ssl: bool,
) -> Result<PgStore, Box<dyn std::error::Error>> {
    let url = url::Url::parse(database_url)?;
    let db_name = url.path().trim_start_matches('/');

    let mut admin_url = url.clone();
    admin_url.set_path("/postgres");

    let mut admin_options = PgConnectOptions::from_str(admin_url.as_str())?;
    if require_ssl {
        admin_options = admin_options.ssl_mode(PgSslMode::Require);
    }

    let admin_pool = PgPool::connect_with(admin_options).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&admin_pool)
            .await?;

    if !exists {
        log::info!("Creating database {}", db_name);
        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name.replace('"', "")))
            .execute(&admin_pool)
            .await?;
    }

    admin_pool.close().await;

    let mut options = PgConnectOptions::from_str(database_url)?;
    if require_ssl {
        options = options.ssl_mode(PgSslMode::Require);
    }
    let pool = PgPool::connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Database migrations applied");

    Ok(PgStore::new(Arc::new(pool)))
}
