//! PostgreSQL ledger for integration tests
//!
//! Each [`TestDatabase`] owns a throwaway container with the ledger schema
//! migrated in. The container stops when the value is dropped.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers_modules::postgres::Postgres;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};

const POSTGRES_TAG: &str = "16-alpine";
const LEDGER_DB: &str = "reconciliation_test";
const LEDGER_USER: &str = "ledger";
const LEDGER_PASSWORD: &str = "ledger";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Builds the connection URL for a container reachable at `host:port`
pub fn ledger_url(host: &str, port: u16) -> String {
    format!("postgres://{LEDGER_USER}:{LEDGER_PASSWORD}@{host}:{port}/{LEDGER_DB}")
}

/// A migrated ledger database running in a container
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    url: String,
    pool: PgPool,
}

impl TestDatabase {
    /// Starts PostgreSQL and applies the workspace migrations
    ///
    /// # Errors
    ///
    /// Fails when Docker is unavailable, the container never becomes ready,
    /// or a migration does not apply.
    pub async fn new() -> Result<Self, BoxError> {
        let container = Postgres::default()
            .with_db_name(LEDGER_DB)
            .with_user(LEDGER_USER)
            .with_password(LEDGER_PASSWORD)
            .with_tag(POSTGRES_TAG)
            .start()
            .await?;

        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(5432).await?;
        let url = ledger_url(&host, port);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&url)
            .await?;

        sqlx::migrate!("../../migrations").run(&pool).await?;

        Ok(Self {
            _container: container,
            url,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Connection URL, for code that builds its own pool
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Assertions on raw query results
pub trait DatabaseTestAssertions {
    /// Asserts that a specific number of rows were affected
    fn assert_rows_affected(&self, expected: u64);
}

impl DatabaseTestAssertions for sqlx::postgres::PgQueryResult {
    fn assert_rows_affected(&self, expected: u64) {
        assert_eq!(
            self.rows_affected(),
            expected,
            "expected {expected} rows affected, got {}",
            self.rows_affected()
        );
    }
}
