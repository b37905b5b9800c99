//! Application state for the API server.

use switchboard_common::Result;
use switchboard_coordinator::{IntentRouter, SwitchboardConfig};

use crate::auth::ApiKeyConfig;

/// Shared application state for the API server.
pub struct AppState {
    /// Stateless across requests, so no lock is needed
    pub router: IntentRouter,

    /// Bearer key required on every route except `/health`
    pub api_key: Option<ApiKeyConfig>,

    /// Server start time (for health checks)
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(router: IntentRouter) -> Self {
        Self {
            router,
            api_key: None,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn from_config(config: &SwitchboardConfig) -> Result<Self> {
        Ok(Self::new(IntentRouter::from_config(config)?))
    }

    pub fn with_api_key(mut self, api_key: ApiKeyConfig) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Get the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
