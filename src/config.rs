//! # Multiplexer Configuration
//!
//! Layered configuration loaded with the `config` crate: built-in defaults,
//! then an optional file, then `HANDLER_MUX_*` environment variables.
//!
//! ```rust,no_run
//! use handler_mux::config::MuxConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MuxConfig::load()?;
//! assert_eq!(config.inter_tenant_protocol, "bundle");
//! # Ok(())
//! # }
//! ```

use crate::constants::{CONFIG_ENV_PREFIX, INTER_TENANT_PROTOCOL, LOCAL_FILE_PROTOCOL};
use crate::error::{MuxError, Result};
use crate::handlers::is_valid_scheme;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxConfig {
    /// Opt-in value used when a tenant registers without stating one
    pub url_handlers_enabled: bool,
    /// Protocol left to the host's built-in handling, never proxied
    pub local_file_protocol: String,
    /// Protocol served by one process-wide shared proxy
    pub inter_tenant_protocol: String,
    /// Explicit log filter; falls back to the environment's default level
    pub log_level: Option<String>,
    /// `pretty` or `json`
    pub log_format: String,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            url_handlers_enabled: true,
            local_file_protocol: LOCAL_FILE_PROTOCOL.to_string(),
            inter_tenant_protocol: INTER_TENANT_PROTOCOL.to_string(),
            log_level: None,
            log_format: "pretty".to_string(),
        }
    }
}

impl MuxConfig {
    /// Load defaults overlaid with `HANDLER_MUX_*` environment variables
    pub fn load() -> Result<Self> {
        Self::from_sources(None, CONFIG_ENV_PREFIX)
    }

    /// Load defaults, then `path` (if it exists), then environment variables
    /// carrying `env_prefix`
    pub fn from_sources(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("url_handlers_enabled", defaults.url_handlers_enabled)?
            .set_default("local_file_protocol", defaults.local_file_protocol)?
            .set_default("inter_tenant_protocol", defaults.inter_tenant_protocol)?
            .set_default("log_format", defaults.log_format)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let mut config: MuxConfig = builder
            .add_source(Environment::with_prefix(env_prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Lowercase the reserved protocols; scheme names are case-insensitive
    pub fn normalize(&mut self) {
        self.local_file_protocol.make_ascii_lowercase();
        self.inter_tenant_protocol.make_ascii_lowercase();
    }

    pub fn validate(&self) -> Result<()> {
        for (field, protocol) in [
            ("local_file_protocol", &self.local_file_protocol),
            ("inter_tenant_protocol", &self.inter_tenant_protocol),
        ] {
            if !is_valid_scheme(protocol) {
                return Err(MuxError::ConfigurationError(format!(
                    "{field} '{protocol}' is not a valid scheme name"
                )));
            }
        }

        if self
            .local_file_protocol
            .eq_ignore_ascii_case(&self.inter_tenant_protocol)
        {
            return Err(MuxError::ConfigurationError(format!(
                "local_file_protocol and inter_tenant_protocol must differ (both '{}')",
                self.local_file_protocol
            )));
        }

        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            return Err(MuxError::ConfigurationError(format!(
                "log_format must be 'pretty' or 'json', got '{}'",
                self.log_format
            )));
        }

        Ok(())
    }
}
