use std::str::FromStr;

use crudsync_core::collection::DeploymentVariant;
use crudsync_core::types::DbId;

/// How a sync batch is written to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// The whole batch runs in one transaction and rolls back on failure.
    #[default]
    Atomic,
    /// No transaction; creates, updates and deletes fan out over the pool.
    /// A failure part-way leaves earlier writes in place.
    Concurrent,
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atomic" => Ok(SyncMode::Atomic),
            "concurrent" => Ok(SyncMode::Concurrent),
            other => Err(format!("unknown sync mode '{other}'")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `1337`, the port the widget demo expects).
    pub port: u16,
    /// Maximum pooled database connections (default: `10`).
    pub max_connections: u32,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Batch write strategy for `/sync` (default: atomic).
    pub sync_mode: SyncMode,
    /// Collections served by `/load` (default: pro).
    pub variant: DeploymentVariant,
    /// Calendar reported as the project calendar by `/load`.
    pub project_calendar_id: Option<DbId>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `1337`                     |
    /// | `DB_MAX_CONNECTIONS`   | `10`                       |
    /// | `CORS_ORIGINS`         | `http://localhost:8080`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SYNC_MODE`            | `atomic`                   |
    /// | `DEPLOYMENT_VARIANT`   | `pro`                      |
    /// | `PROJECT_CALENDAR_ID`  | unset                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "1337".into())
            .parse()
            .expect("PORT must be a valid u16");

        let max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:8080".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let sync_mode: SyncMode = std::env::var("SYNC_MODE")
            .unwrap_or_else(|_| "atomic".into())
            .parse()
            .unwrap_or_else(|e| panic!("SYNC_MODE: {e}"));

        let variant: DeploymentVariant = std::env::var("DEPLOYMENT_VARIANT")
            .unwrap_or_else(|_| "pro".into())
            .parse()
            .unwrap_or_else(|e| panic!("DEPLOYMENT_VARIANT: {e}"));

        let project_calendar_id = std::env::var("PROJECT_CALENDAR_ID")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<DbId>()
                    .expect("PROJECT_CALENDAR_ID must be a valid id")
            });

        Self {
            host,
            port,
            max_connections,
            cors_origins,
            request_timeout_secs,
            sync_mode,
            variant,
            project_calendar_id,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
