//! Application state shared by all handlers

use crate::config::Config;

pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        if config.signature_base64.is_none() {
            tracing::warn!("SIGNATURE_BASE64 is not set; signing requests will fail");
        }
        Self { config }
    }
}
