use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub cors_origins: Vec<String>,
    /// Allow GET on `/api/posts` without a bearer token.
    pub posts_public_reads: bool,
    pub token_ttl: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            database_url: None,
            cors_origins: vec!["*".into()],
            posts_public_reads: false,
            token_ttl: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let posts_public_reads = match std::env::var("POSTS_PUBLIC_READS") {
            Ok(value) => parse_bool(&value)
                .ok_or_else(|| anyhow::anyhow!("invalid POSTS_PUBLIC_READS: {}", value))?,
            Err(_) => false,
        };
        let token_ttl = match std::env::var("TOKEN_TTL_MINUTES") {
            Ok(value) => Some(parse_ttl_minutes(&value)?),
            Err(_) => None,
        };

        Ok(Self {
            host,
            port,
            database_url,
            cors_origins,
            posts_public_reads,
            token_ttl,
        })
    }
}

fn parse_ttl_minutes(value: &str) -> anyhow::Result<Duration> {
    let minutes: u64 = value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid TOKEN_TTL_MINUTES: {}", e))?;
    let seconds = minutes
        .checked_mul(60)
        .ok_or_else(|| anyhow::anyhow!("TOKEN_TTL_MINUTES is too large: {}", minutes))?;
    Ok(Duration::from_secs(seconds))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
