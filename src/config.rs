use anyhow::Context;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub jwt_refresh_ttl_secs: i64,

    pub auth_rate_limit_max: u32,
    pub auth_rate_limit_window_secs: u64,

    // Buffered change events per feed before slow subscribers start lagging
    pub realtime_channel_capacity: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", "8080")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|v| split_origins(&v))
                .unwrap_or_default(),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_access_ttl_secs: parse_var("JWT_ACCESS_TTL_SECS", "900")?,
            jwt_refresh_ttl_secs: parse_var("JWT_REFRESH_TTL_SECS", "604800")?,

            auth_rate_limit_max: parse_var("AUTH_RATE_LIMIT_MAX", "5")?,
            auth_rate_limit_window_secs: parse_var("AUTH_RATE_LIMIT_WINDOW_SECS", "60")?,

            realtime_channel_capacity: parse_var("REALTIME_CHANNEL_CAPACITY", "256")?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.auth_rate_limit_window_secs == 0 {
            anyhow::bail!("AUTH_RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }
        if self.auth_rate_limit_max == 0 {
            anyhow::bail!("AUTH_RATE_LIMIT_MAX must be greater than zero");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Frontend origin first, then any extra origins, in configuration order.
    pub fn allowed_origins(&self) -> Vec<&str> {
        std::iter::once(self.frontend_url.as_str())
            .chain(self.cors_extra_origins.iter().map(String::as_str))
            .collect()
    }
}

fn parse_var<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(key).unwrap_or_else(|_| default.into());
    raw.trim()
        .parse()
        .with_context(|| format!("{} must be a number, got {:?}", key, raw))
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}
