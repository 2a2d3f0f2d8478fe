use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub cache: CacheConfig,
    pub queue: QueueConfig,
    pub webhook: WebhookConfig,
    pub api_key: ApiKeyConfig,
    pub stats: StatsConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Active-zone snapshot cache settings
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub active_zones_key: String,
}

/// Durable alert queue settings
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis list holding serialized alert payloads
    pub key: String,
    /// Server-side BRPOP timeout; the consumer loops on expiry
    pub poll_interval: Duration,
    /// Capacity of the in-process handoff channel between requests and the queue
    pub channel_capacity: usize,
}

/// Outbound webhook delivery settings
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Total attempts, including the first one
    pub max_retries: u32,
    /// Linear backoff base: attempt `n` failing waits `n * retry_delay`
    pub retry_delay: Duration,
}

#[derive(Clone)]
pub struct ApiKeyConfig {
    pub operator_key: String,
}

#[derive(Debug, Clone)]
pub struct StatsConfig {
    pub window_minutes: i32,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl std::fmt::Debug for ApiKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyConfig")
            .field("operator_key", &"***")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            queue: QueueConfig::from_env()?,
            webhook: WebhookConfig::from_env()?,
            api_key: ApiKeyConfig::from_env()?,
            stats: StatsConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 25;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 300; // 5 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl RedisConfig {
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string());

        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err("REDIS_URL must start with redis:// or rediss://".to_string());
        }

        Ok(Self { url })
    }
}

impl CacheConfig {
    const DEFAULT_TTL_SECS: u64 = 300; // 5 minutes
    const DEFAULT_ACTIVE_ZONES_KEY: &'static str = "active_incidents";

    pub fn from_env() -> Result<Self, String> {
        let ttl_secs = env::var("CACHE_TTL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "CACHE_TTL_SECS must be a valid number".to_string())?;

        if ttl_secs == 0 {
            return Err("CACHE_TTL_SECS must be greater than zero".to_string());
        }

        let active_zones_key = env::var("CACHE_ACTIVE_ZONES_KEY")
            .unwrap_or_else(|_| Self::DEFAULT_ACTIVE_ZONES_KEY.to_string());

        Ok(Self {
            ttl: Duration::from_secs(ttl_secs),
            active_zones_key,
        })
    }
}

impl QueueConfig {
    const DEFAULT_KEY: &'static str = "webhook_queue";
    const DEFAULT_POLL_SECS: u64 = 5;
    const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

    pub fn from_env() -> Result<Self, String> {
        let key = env::var("QUEUE_KEY").unwrap_or_else(|_| Self::DEFAULT_KEY.to_string());

        let poll_secs = env::var("QUEUE_POLL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_POLL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "QUEUE_POLL_SECS must be a valid number".to_string())?;

        let channel_capacity = env::var("ALERT_CHANNEL_CAPACITY")
            .unwrap_or_else(|_| Self::DEFAULT_CHANNEL_CAPACITY.to_string())
            .parse::<usize>()
            .map_err(|_| "ALERT_CHANNEL_CAPACITY must be a valid number".to_string())?;

        if channel_capacity == 0 {
            return Err("ALERT_CHANNEL_CAPACITY must be greater than zero".to_string());
        }

        Ok(Self {
            key,
            poll_interval: Duration::from_secs(poll_secs.max(1)),
            channel_capacity,
        })
    }
}

impl WebhookConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_MAX_RETRIES: u32 = 3;
    const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

    pub fn from_env() -> Result<Self, String> {
        let url =
            env::var("WEBHOOK_URL").unwrap_or_else(|_| "http://localhost:9090/webhook".to_string());

        let timeout_secs = env::var("WEBHOOK_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "WEBHOOK_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_retries = env::var("WEBHOOK_MAX_RETRIES")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_RETRIES.to_string())
            .parse::<u32>()
            .map_err(|_| "WEBHOOK_MAX_RETRIES must be a valid number".to_string())?;

        if max_retries == 0 {
            return Err("WEBHOOK_MAX_RETRIES must be at least 1".to_string());
        }

        let retry_delay_ms = env::var("WEBHOOK_RETRY_DELAY_MS")
            .unwrap_or_else(|_| Self::DEFAULT_RETRY_DELAY_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "WEBHOOK_RETRY_DELAY_MS must be a valid number".to_string())?;

        Ok(Self {
            url,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            retry_delay: Duration::from_millis(retry_delay_ms),
        })
    }
}

impl ApiKeyConfig {
    pub fn from_env() -> Result<Self, String> {
        let operator_key = env::var("API_KEY_OPERATOR")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "API_KEY_OPERATOR environment variable is required".to_string())?;

        Ok(Self { operator_key })
    }
}

impl StatsConfig {
    const DEFAULT_WINDOW_MINUTES: i32 = 60;

    pub fn from_env() -> Result<Self, String> {
        let window_minutes = env::var("STATS_WINDOW_MINUTES")
            .unwrap_or_else(|_| Self::DEFAULT_WINDOW_MINUTES.to_string())
            .parse::<i32>()
            .map_err(|_| "STATS_WINDOW_MINUTES must be a valid number".to_string())?;

        Ok(Self {
            window_minutes: window_minutes.max(1),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title =
            env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Geofence Alert API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Incident zones and location alerts".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
