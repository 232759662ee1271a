//! # System Constants
//!
//! Reserved protocol names, mime types and environment keys shared across
//! the multiplexer.

/// Protocol that is never proxied and always falls through to the host
pub const LOCAL_FILE_PROTOCOL: &str = "file";

/// Protocol whose handler is shared process-wide rather than tenant-scoped
pub const INTER_TENANT_PROTOCOL: &str = "bundle";

/// Environment variable prefix consumed by [`crate::config::MuxConfig`]
pub const CONFIG_ENV_PREFIX: &str = "HANDLER_MUX";

/// Environment detection order used by logging
pub const ENVIRONMENT_VARIABLES: [&str; 2] = ["HANDLER_MUX_ENV", "APP_ENV"];

pub const DEFAULT_ENVIRONMENT: &str = "development";

pub mod mime {
    pub const TEXT_PLAIN: &str = "text/plain";
    pub const APPLICATION_JSON: &str = "application/json";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}
