//! Application state for API handlers

use chrono::{DateTime, Utc};
use kpi_engine::{Clock, GovernanceEngine};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Governance engine
    pub engine: Arc<GovernanceEngine>,

    /// Source of "now" for every request
    pub clock: Arc<dyn Clock>,

    /// Service version
    pub version: String,

    /// Service start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(engine: Arc<GovernanceEngine>, clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now();
        Self {
            engine,
            clock,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let secs = (self.now() - self.started_at).num_seconds().max(0);
        let (hours, rest) = (secs / 3600, secs % 3600);
        format!("{}h {}m {}s", hours, rest / 60, rest % 60)
    }
}
