use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// When set, bearer tokens must carry a valid HS256 signature.
    pub jwt_secret: Option<String>,
    /// Optional; assistant rate limiting is disabled without it.
    pub redis_url: Option<String>,
    pub assistant_rate_limit: u64,
    pub reminder_send_hour: u32,
    // SMTP (optional)
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let reminder_send_hour: u32 = env::var("REMINDER_SEND_HOUR")
            .unwrap_or_else(|_| "9".into())
            .parse()?;
        anyhow::ensure!(
            reminder_send_hour < 24,
            "REMINDER_SEND_HOUR must be between 0 and 23, got {reminder_send_hour}"
        );

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".into())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            jwt_secret: optional("JWT_SECRET"),
            redis_url: optional("REDIS_URL"),
            assistant_rate_limit: env::var("ASSISTANT_RATE_LIMIT")
                .unwrap_or_else(|_| "60".into())
                .parse()?,
            reminder_send_hour,
            smtp_host: optional("SMTP_HOST"),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|v| v.parse().ok()),
            smtp_username: optional("SMTP_USERNAME"),
            smtp_password: optional("SMTP_PASSWORD"),
            smtp_from: optional("SMTP_FROM"),
        })
    }

    /// Minimal config for tools and tests that only talk to the database.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            database_max_connections: 5,
            host: "127.0.0.1".into(),
            port: 0,
            jwt_secret: None,
            redis_url: None,
            assistant_rate_limit: 60,
            reminder_send_hour: 9,
            smtp_host: None,
            smtp_port: None,
            smtp_username: None,
            smtp_password: None,
            smtp_from: None,
        }
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}
