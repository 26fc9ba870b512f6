use crate::config::AppConfig;
use crate::db;
use crate::templates::Templates;
use sqlx::AnyPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: AnyPool,
    pub config: Arc<AppConfig>,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config).await?;
        let templates = Arc::new(Templates::new()?);
        Ok(Self::from_parts(db, config, templates))
    }

    pub fn from_parts(db: AnyPool, config: Arc<AppConfig>, templates: Arc<Templates>) -> Self {
        Self {
            db,
            config,
            templates,
        }
    }

    /// Private in-memory SQLite store for tests.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let config = Arc::new(
            AppConfig::from_lookup(|key| {
                (key == "DATABASE_URL").then(|| "sqlite::memory:".to_string())
            })
            .expect("in-memory config"),
        );
        let db = db::connect(&config).await.expect("in-memory pool");
        let templates = Arc::new(Templates::new().expect("templates compile"));
        Self::from_parts(db, config, templates)
    }

    /// State whose store cannot be opened; every query fails.
    #[cfg(test)]
    pub fn unreachable() -> Self {
        use std::time::Duration;

        sqlx::any::install_default_drivers();
        let url = "sqlite:///nonexistent-dir/for-tests/todo.db";
        let config = Arc::new(
            AppConfig::from_lookup(|key| (key == "DATABASE_URL").then(|| url.to_string()))
                .expect("config"),
        );
        let db = sqlx::any::AnyPoolOptions::new()
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy(url)
            .expect("lazy pool ok");
        let templates = Arc::new(Templates::new().expect("templates compile"));
        Self::from_parts(db, config, templates)
    }
}
