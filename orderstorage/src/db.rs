use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::{StorageError, classify_sqlx_error};

/// Thin wrapper over the pool plus migration entry point, mirroring how the
/// original keeps connection setup and DDL together ahead of the repository
/// that uses them.
#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
}

impl Db {
    /// A malformed DSN (bad scheme, unparseable host/port) is classified as
    /// `StorageError::ConfigInvalid` rather than a generic connection
    /// failure — it will never succeed on retry, unlike a reachable-but-down
    /// database.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| classify_sqlx_error(e, ""))?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        crate::schema::migrate(&self.pool).await
    }
}
