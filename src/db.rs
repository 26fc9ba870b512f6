use anyhow::Context;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tracing::{debug, error, info};

use crate::config::{AppConfig, DbBackend};
use crate::state::AppState;

// created_at is RFC 3339 text on both backends so rows decode through the
// `Any` driver; the column default keeps the same format for other writers.
const SQLITE_TODOS_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS todos (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        title       VARCHAR(200) NOT NULL,
        description VARCHAR(500) NOT NULL,
        created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
    )
"#;

const POSTGRES_TODOS_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS todos (
        id          BIGSERIAL PRIMARY KEY,
        title       VARCHAR(200) NOT NULL,
        description VARCHAR(500) NOT NULL,
        created_at  TEXT NOT NULL
                    DEFAULT (to_char(now() AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"'))
    )
"#;

fn todos_ddl(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Sqlite => SQLITE_TODOS_DDL,
        DbBackend::Postgres => POSTGRES_TODOS_DDL,
    }
}

/// Pool tuning per backend; the pool knobs only apply to network stores.
fn pool_options(config: &AppConfig) -> AnyPoolOptions {
    if config.backend.is_network() {
        let pool = &config.pool;
        AnyPoolOptions::new()
            .test_before_acquire(pool.pre_ping)
            .max_lifetime(pool.recycle)
            .max_connections(pool.max_connections())
    } else if config.in_memory() {
        // every connection to `:memory:` is a separate database
        AnyPoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        AnyPoolOptions::new()
    }
}

/// Open the pool for the configured store.
pub async fn connect(config: &AppConfig) -> anyhow::Result<AnyPool> {
    sqlx::any::install_default_drivers();

    let db = pool_options(config)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    info!(backend = ?config.backend, "database pool ready");
    Ok(db)
}

pub async fn create_table(db: &AnyPool, backend: DbBackend) -> anyhow::Result<()> {
    sqlx::query(todos_ddl(backend))
        .execute(db)
        .await
        .context("create todos table")?;
    Ok(())
}

/// Idempotent; a failure is logged and the caller carries on.
pub async fn ensure_table(state: &AppState) {
    match create_table(&state.db, state.config.backend).await {
        Ok(()) => debug!("todos table present"),
        Err(e) => error!(error = %format!("{:#}", e), "error creating tables; continuing"),
    }
}
