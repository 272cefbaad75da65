use std::env;

use crate::shared::constants::{
    DEFAULT_SCHEMA_CACHE_CAPACITY, MAX_SCHEMA_CACHE_CAPACITY, MIN_SCHEMA_CACHE_CAPACITY,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub forms: FormsConfig,
    pub webhook: WebhookConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
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

/// Which blob backend stores attachment bytes. Both accept the same
/// `forms/...` paths, so switching backends never changes the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local backend
    pub local_root: String,
    /// Upper bound on any single blob-store call
    pub request_timeout_secs: u64,
    pub s3: S3Config,
}

/// S3-compatible object storage configuration (MinIO, AWS S3, ...)
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

/// Limits and tuning for the forms domain itself
#[derive(Debug, Clone)]
pub struct FormsConfig {
    /// Entries held by the schema cache; clamped to a sane range
    pub schema_cache_capacity: usize,
    /// Per-file upload size limit in bytes
    pub max_file_size: usize,
    /// Per-field cap on the number of files in one submission
    pub max_files_per_field: usize,
    /// Age after which pending uploads are swept by the cleanup worker
    pub stale_upload_retention_hours: u64,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub enabled: bool,
    /// Globally notified URLs; per-template URLs are added on top
    pub urls: Vec<String>,
    /// Shared secret for signing payloads, if set
    pub secret: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            // Only error if it's not "file not found" - that's acceptable
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            forms: FormsConfig::from_env()?,
            webhook: WebhookConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

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

impl StorageConfig {
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    pub fn from_env() -> Result<Self, String> {
        let backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local,
            "s3" => StorageBackend::S3,
            other => {
                return Err(format!(
                    "Invalid STORAGE_BACKEND '{}' (expected 'local' or 's3')",
                    other
                ))
            }
        };

        let local_root = env::var("STORAGE_LOCAL_ROOT").unwrap_or_else(|_| "uploads".to_string());

        let request_timeout_secs = env::var("STORAGE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "STORAGE_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            backend,
            local_root,
            request_timeout_secs,
            s3: S3Config::from_env()?,
        })
    }
}

impl S3Config {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("S3_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        let access_key = env::var("S3_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("S3_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket = env::var("S3_BUCKET").unwrap_or_else(|_| "formgate-uploads".to_string());

        let region = env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            bucket,
            region,
        })
    }
}

impl FormsConfig {
    const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10MB
    const DEFAULT_MAX_FILES_PER_FIELD: usize = 5;
    const DEFAULT_STALE_UPLOAD_RETENTION_HOURS: u64 = 24;

    pub fn from_env() -> Result<Self, String> {
        let schema_cache_capacity = env::var("SCHEMA_CACHE_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_SCHEMA_CACHE_CAPACITY.to_string())
            .parse::<usize>()
            .map_err(|_| "SCHEMA_CACHE_CAPACITY must be a valid number".to_string())?
            .clamp(MIN_SCHEMA_CACHE_CAPACITY, MAX_SCHEMA_CACHE_CAPACITY);

        let max_file_size = env::var("MAX_FILE_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_FILE_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_FILE_SIZE must be a valid number".to_string())?;

        let max_files_per_field = env::var("MAX_FILES_PER_FIELD")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_FILES_PER_FIELD.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_FILES_PER_FIELD must be a valid number".to_string())?;

        let stale_upload_retention_hours = env::var("STALE_UPLOAD_RETENTION_HOURS")
            .unwrap_or_else(|_| Self::DEFAULT_STALE_UPLOAD_RETENTION_HOURS.to_string())
            .parse::<u64>()
            .map_err(|_| "STALE_UPLOAD_RETENTION_HOURS must be a valid number".to_string())?;

        Ok(Self {
            schema_cache_capacity,
            max_file_size,
            max_files_per_field,
            stale_upload_retention_hours,
        })
    }
}

impl WebhookConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 10;

    pub fn from_env() -> Result<Self, String> {
        let enabled = env::var("WEBHOOKS_ENABLED")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        // Comma-separated list of globally notified URLs
        let urls = env::var("WEBHOOK_URLS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let secret = env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());

        let timeout_secs = env::var("WEBHOOK_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "WEBHOOK_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            enabled,
            urls,
            secret,
            timeout_secs,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Formgate API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Dynamic form intake API documentation".to_string());

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
