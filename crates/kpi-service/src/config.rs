//! Configuration for kpid

use kpi_engine::{EntryWindow, PeriodClock, RolePolicy};
use kpi_types::GovernanceResult;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Monthly entry window
    #[serde(default)]
    pub window: WindowConfig,

    /// Administrator identities
    #[serde(default)]
    pub access: AccessConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Catalog seeding
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Allow cross-origin requests from any origin
    #[serde(default)]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: false,
        }
    }
}

/// Entry window, in days of the month, evaluated at a fixed UTC offset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_start_day")]
    pub start_day: u32,

    #[serde(default = "default_end_day")]
    pub end_day: u32,

    /// Offset of the organization's calendar from UTC
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start_day: default_start_day(),
            end_day: default_end_day(),
            utc_offset_minutes: 0,
        }
    }
}

impl WindowConfig {
    pub fn period_clock(&self) -> GovernanceResult<PeriodClock> {
        let window = EntryWindow::new(self.start_day, self.end_day)?;
        PeriodClock::new(window).with_utc_offset_minutes(self.utc_offset_minutes)
    }
}

/// Access configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Actor identities treated as administrators whatever their role
    #[serde(default)]
    pub superusers: Vec<String>,
}

impl AccessConfig {
    pub fn policy(&self) -> RolePolicy {
        RolePolicy::new().with_superusers(self.superusers.iter().cloned())
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// JSON journal file, rewritten after every mutation
    Journal {
        /// Journal file path
        path: PathBuf,
    },
}

/// Catalog seeding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON seed file applied at startup; existing codes are skipped
    #[serde(default)]
    pub seed: Option<PathBuf>,

    /// Tenant the seeded processes belong to
    #[serde(default = "default_tenant")]
    pub tenant: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            seed: None,
            tenant: default_tenant(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_start_day() -> u32 {
    1
}

fn default_end_day() -> u32 {
    10
}

fn default_tenant() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    /// Load configuration: defaults, then the optional file, then `KPI_*`
    /// environment variables (`KPI_WINDOW__END_DAY=12`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ServiceConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("KPI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
