//! Application state management

use crate::config::AppConfig;
use crate::error::Result;
use crate::source::{HttpReportSource, TradeSource};
use crate::storage::DayFileStore;
use std::sync::Arc;

/// State shared by all commands of one invocation
pub struct AppState {
    /// Effective configuration
    pub config: AppConfig,

    /// Remote report source
    pub source: Arc<dyn TradeSource>,

    /// Day file directory
    pub store: DayFileStore,
}

impl AppState {
    /// Create state backed by the public HTTP source
    pub fn new(config: AppConfig) -> Result<Self> {
        let source = Arc::new(HttpReportSource::from_config(&config)?);
        Ok(Self::with_source(config, source))
    }

    /// Create state with an explicit source
    pub fn with_source(config: AppConfig, source: Arc<dyn TradeSource>) -> Self {
        let store = DayFileStore::new(config.data_dir.clone());
        Self {
            config,
            source,
            store,
        }
    }
}
