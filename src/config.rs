use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://todo.db?mode=rwc";

/// Store flavour behind `DATABASE_URL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Sqlite,
    Postgres,
}

impl DbBackend {
    pub fn from_url(url: &str) -> anyhow::Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => anyhow::bail!("unsupported database scheme `{}`", other),
        }
    }

    pub fn is_network(self) -> bool {
        matches!(self, Self::Postgres)
    }
}

/// Pool tuning; only applied to network databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub pre_ping: bool,
    pub recycle: Duration,
    pub size: u32,
    pub max_overflow: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pre_ping: true,
            recycle: Duration::from_secs(300),
            size: 10,
            max_overflow: 5,
        }
    }
}

impl PoolConfig {
    pub fn max_connections(&self) -> u32 {
        self.size + self.max_overflow
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub backend: DbBackend,
    pub pool: PoolConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let backend = DbBackend::from_url(&database_url)?;

        let defaults = PoolConfig::default();
        let pool = PoolConfig {
            pre_ping: lookup("DB_POOL_PRE_PING")
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(defaults.pre_ping),
            recycle: lookup("DB_POOL_RECYCLE_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.recycle),
            size: lookup("DB_POOL_SIZE")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.size),
            max_overflow: lookup("DB_MAX_OVERFLOW")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.max_overflow),
        };

        Ok(Self {
            database_url,
            backend,
            pool,
        })
    }

    pub fn in_memory(&self) -> bool {
        self.backend == DbBackend::Sqlite && self.database_url.contains(":memory:")
    }
}
