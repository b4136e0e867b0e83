use crate::config::AppConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bb8::{ManageConnection, Pool};
use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};
use tokio_postgres::{Config as PgConfig, NoTls};
use tracing::{error, info};

pub type PgPool = Pool<PgConnectionManager>;

/// Idempotent DDL for the `crash` table, applied once at startup.
pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

/// Builds the connection pool, verifies the database is reachable and makes
/// sure the `crash` table exists. Either failure is fatal.
pub async fn connect_pool(config: &AppConfig) -> Result<PgPool> {
    let manager = PgConnectionManager::new(&config.database_url)?;
    let pool = Pool::builder()
        .max_size(config.max_pool_size)
        .connection_timeout(config.request_timeout)
        .build(manager)
        .await
        .context("failed to build PostgreSQL connection pool")?;

    {
        let mut conn = match pool.get().await {
            Ok(conn) => {
                info!("database connectivity check succeeded");
                conn
            }
            Err(err) => {
                error!(error = ?err, "initial database connectivity check failed");
                anyhow::bail!("database is unreachable: {err:?}");
            }
        };
        conn.batch_execute(SCHEMA_SQL)
            .await
            .context("failed to bootstrap crash schema")?;
        info!("crash schema is in place");
    }

    Ok(pool)
}

/// A pool that opens connections lazily; used where no query will run.
pub fn lazy_pool(config: &AppConfig) -> Result<PgPool> {
    let manager = PgConnectionManager::new(&config.database_url)?;
    Ok(Pool::builder()
        .max_size(config.max_pool_size)
        .connection_timeout(config.request_timeout)
        .build_unchecked(manager))
}

#[derive(Clone)]
pub struct PgConnectionManager {
    config: PgConfig,
}

impl PgConnectionManager {
    fn new(database_url: &str) -> Result<Self> {
        let config = database_url
            .parse::<PgConfig>()
            .context("invalid database URL")?;
        Ok(Self { config })
    }
}

#[async_trait]
impl ManageConnection for PgConnectionManager {
    type Connection = AsyncPgConnection;
    type Error = anyhow::Error;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let (client, connection) = self.config.connect(NoTls).await?;
        AsyncPgConnection::try_from_client_and_connection(client, connection)
            .await
            .map_err(|err| anyhow::anyhow!(err))
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.batch_execute("SELECT 1").await?;
        Ok(())
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}
