use anyhow::Context;
use axum::{
    body::{self, Body},
    http::{self, Request, StatusCode},
    Router,
};
use crash_api::{
    config::AppConfig,
    db::{self, PgPool, SCHEMA_SQL},
    server::Server,
};
use diesel_async::SimpleAsyncConnection;
use serde_json::Value;
use std::{env, fs, future::Future, path::PathBuf, sync::Once};
use tokio::{
    task::JoinHandle,
    time::{sleep, Duration},
};
use tokio_postgres::{Client, Config as PgConfig, NoTls};
use tower::ServiceExt;

const DATABASE_URL_ENV: &str = "CRASH_TEST_DATABASE_URL";
const DB_CONNECT_RETRIES: usize = 120;
const DB_CONNECT_DELAY_MS: u64 = 250;
const FIXTURE_LOCK_ID: i64 = 5_120_319;

static TRACING_INIT: Once = Once::new();

/// Runs a test closure against a router backed by the seeded `crash` fixture.
/// Skips quietly when no test database is configured.
pub async fn with_crash_harness<F, Fut>(test: F)
where
    F: FnOnce(CrashTestHarness) -> Fut,
    Fut: Future<Output = ()>,
{
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });

    let database_url = match env::var(DATABASE_URL_ENV) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => {
            eprintln!("[crash-test] skipping crash harness: {DATABASE_URL_ENV} is not set");
            return;
        }
    };

    let guard = FixtureGuard::acquire(&database_url)
        .await
        .expect("failed to acquire fixture lock");
    guard
        .seed()
        .await
        .expect("failed to seed fixture database");

    let config = AppConfig::for_database(database_url.clone());
    let pool = db::connect_pool(&config)
        .await
        .expect("fixture database should be reachable");
    let server = Server::with_pool(config, pool.clone()).expect("failed to build crash server");

    let harness = CrashTestHarness {
        router: server.router(),
        pool,
        database_url,
    };

    test(harness).await;

    drop(guard);
}

#[derive(Clone)]
pub struct CrashTestHarness {
    router: Router,
    pool: PgPool,
    database_url: String,
}

impl CrashTestHarness {
    pub async fn get(&self, uri: &str) -> http::Response<Body> {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("failed to build harness request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should handle harness request")
    }

    #[allow(dead_code)]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[allow(dead_code)]
    pub fn config(&self) -> AppConfig {
        AppConfig::for_database(self.database_url.clone())
    }

    /// Runs raw statements on a pooled connection, e.g. to break the fixture.
    #[allow(dead_code)]
    pub async fn execute_sql(&self, sql: &str) {
        let mut conn = self
            .pool
            .get()
            .await
            .expect("pooled connection should be available");
        conn.batch_execute(sql)
            .await
            .expect("fixture statement should succeed");
    }
}

pub async fn read_json(response: http::Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("response body should be readable");
    let value =
        serde_json::from_slice::<Value>(&bytes).expect("response body should be valid JSON");
    (status, value)
}

/// Holds a session-level advisory lock so concurrent suites do not reseed
/// the same database underneath each other.
struct FixtureGuard {
    client: Client,
    _connection_task: JoinHandle<()>,
}

impl FixtureGuard {
    async fn acquire(database_url: &str) -> anyhow::Result<Self> {
        let config: PgConfig = database_url
            .parse()
            .with_context(|| format!("{DATABASE_URL_ENV} is invalid"))?;
        let (client, task) = connect_with_retry(&config).await?;
        client
            .execute("SELECT pg_advisory_lock($1)", &[&FIXTURE_LOCK_ID])
            .await?;
        Ok(Self {
            client,
            _connection_task: task,
        })
    }

    async fn seed(&self) -> anyhow::Result<()> {
        let seed_sql = load_fixture("seed.sql")?;
        self.client.batch_execute("DROP TABLE IF EXISTS crash").await?;
        self.client.batch_execute(SCHEMA_SQL).await?;
        self.client.batch_execute(&seed_sql).await?;
        Ok(())
    }
}

async fn connect_with_retry(config: &PgConfig) -> anyhow::Result<(Client, JoinHandle<()>)> {
    let mut attempts = 0usize;
    loop {
        match config.connect(NoTls).await {
            Ok((client, connection)) => {
                let task = tokio::spawn(async move {
                    if let Err(err) = connection.await {
                        eprintln!("[crash-test] fixture connection error: {err}");
                    }
                });
                return Ok((client, task));
            }
            Err(err) => {
                attempts += 1;
                if attempts >= DB_CONNECT_RETRIES {
                    return Err(err).context("fixture database never became reachable");
                }
                sleep(Duration::from_millis(DB_CONNECT_DELAY_MS)).await;
            }
        }
    }
}

fn load_fixture(name: &str) -> anyhow::Result<String> {
    let path = fixtures_dir().join(name);
    fs::read_to_string(&path).with_context(|| format!("failed to read fixture {}", path.display()))
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}
