use serde::Deserialize;
use std::str::FromStr;

/// Which `ResponseStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Supabase,
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(StoreBackend::Supabase),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!(
                "STORE_BACKEND must be one of supabase, postgres, memory (got {})",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub database_url: Option<String>,
    pub session_ttl_secs: u64,
    pub session_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            store_backend: StoreBackend::Memory,
            supabase_url: None,
            supabase_anon_key: None,
            database_url: None,
            session_ttl_secs: 3600,
            session_capacity: 10_000,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn numeric_var<T: FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let store_backend = match non_empty_var("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::Supabase,
        };

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            store_backend,
            supabase_url: non_empty_var("SUPABASE_URL"),
            supabase_anon_key: non_empty_var("SUPABASE_ANON_KEY"),
            database_url: non_empty_var("DB_URL").or_else(|| non_empty_var("DATABASE_URL")),
            session_ttl_secs: numeric_var("INTAKE_SESSION_TTL_SECS", 3600)?,
            session_capacity: numeric_var("INTAKE_SESSION_CAPACITY", 10_000)?,
        };
        config.validate()?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Store backend: {:?}", config.store_backend);
        if let Some(ref url) = config.supabase_url {
            tracing::debug!("Supabase URL: {}", url);
        }
        tracing::debug!(
            "Intake sessions: ttl {}s, capacity {}",
            config.session_ttl_secs,
            config.session_capacity
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Checks that the selected backend has what it needs.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.store_backend {
            StoreBackend::Supabase => {
                let url = self.supabase_url.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("SUPABASE_URL environment variable required")
                })?;
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("SUPABASE_URL must start with http:// or https://");
                }
                if self.supabase_anon_key.is_none() {
                    anyhow::bail!("SUPABASE_ANON_KEY environment variable required");
                }
            }
            StoreBackend::Postgres => {
                let url = self.database_url.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })?;
                if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                    anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                }
            }
            StoreBackend::Memory => {}
        }

        if self.session_ttl_secs == 0 {
            anyhow::bail!("INTAKE_SESSION_TTL_SECS must be greater than 0");
        }

        Ok(())
    }
}
