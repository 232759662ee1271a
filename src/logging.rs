//! # Structured Logging Module
//!
//! Environment-aware structured logging for registry and resolution events.

use crate::config::MuxConfig;
use crate::constants::{DEFAULT_ENVIRONMENT, ENVIRONMENT_VARIABLES};
use crate::error::ResolutionTarget;
use crate::tenant::TenantId;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging(config: &MuxConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = config
            .log_level
            .clone()
            .unwrap_or_else(|| get_log_level(&environment));
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

        let layer: Box<dyn Layer<Registry> + Send + Sync> = if config.log_format == "json" {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Use try_init to avoid panic if global subscriber already set
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            log_level = %log_level,
            log_format = %config.log_format,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    ENVIRONMENT_VARIABLES
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for tenant registry operations
pub fn log_registry_operation(
    operation: &str,
    tenant_id: Option<&TenantId>,
    status: &str,
    details: Option<&str>,
) {
    let tenant_id = tenant_id.map(ToString::to_string);
    tracing::info!(
        operation = %operation,
        tenant_id = tenant_id.as_deref(),
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "REGISTRY_OPERATION"
    );
}

/// Log structured data for a proxy resolution attempt
pub fn log_resolution(
    target: &ResolutionTarget,
    tenant_id: Option<&TenantId>,
    status: &str,
    details: Option<&str>,
) {
    let tenant_id = tenant_id.map(ToString::to_string);
    tracing::debug!(
        target_key = %target,
        tenant_id = tenant_id.as_deref(),
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "RESOLUTION"
    );
}
