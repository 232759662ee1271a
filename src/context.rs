//! # Multiplexer Context
//!
//! The process-scoped owner of everything the multiplexer shares: the tenant
//! registry, the handler multiplexer and the hook installer. Built once at
//! startup against a host runtime and passed to whatever manages tenants.

use crate::config::MuxConfig;
use crate::error::Result;
use crate::hooks::{GlobalHookInstaller, HandlerMultiplexer, HostRuntime, InstallState};
use crate::registry::{DecoderCacheStats, RegistryStats, TenantLookup, TenantRegistry};
use crate::resolution::{CallerContext, ContentResolutionProxy, SchemeResolutionProxy};
use crate::tenant::{Tenant, TenantId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Process-scoped multiplexer state
///
/// Constructed once at startup against the host runtime and shared (usually
/// behind an `Arc`) with whatever creates and tears down tenants. Owns:
/// - the tenant registry
/// - the handler multiplexer and its content decoder cache
/// - the installer guarding the host hooks
pub struct MuxContext {
    /// Context instance ID
    pub context_id: Uuid,

    config: Arc<MuxConfig>,
    registry: Arc<TenantRegistry>,
    multiplexer: Arc<HandlerMultiplexer>,
    installer: GlobalHookInstaller,
}

impl std::fmt::Debug for MuxContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MuxContext")
            .field("context_id", &self.context_id)
            .field("config", &self.config)
            .field("registry", &self.registry.stats())
            .field("install_state", &self.installer.state())
            .finish()
    }
}

impl MuxContext {
    /// Create a context with default configuration
    pub fn new(host: Arc<dyn HostRuntime>) -> Self {
        Self::with_config(host, MuxConfig::default())
    }

    pub fn with_config(host: Arc<dyn HostRuntime>, config: MuxConfig) -> Self {
        let registry = Arc::new(TenantRegistry::new());
        let multiplexer = Arc::new(HandlerMultiplexer::new(Arc::clone(&registry), &config));
        let installer = GlobalHookInstaller::new(host, Arc::clone(&multiplexer));
        let context_id = Uuid::new_v4();

        info!(
            context_id = %context_id,
            local_file_protocol = %config.local_file_protocol,
            inter_tenant_protocol = %config.inter_tenant_protocol,
            "Handler multiplexer context created"
        );

        Self {
            context_id,
            config: Arc::new(config),
            registry,
            multiplexer,
            installer,
        }
    }

    /// Load configuration from the environment, then create the context
    pub fn from_env(host: Arc<dyn HostRuntime>) -> Result<Self> {
        Ok(Self::with_config(host, MuxConfig::load()?))
    }

    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TenantRegistry> {
        &self.registry
    }

    pub fn multiplexer(&self) -> &Arc<HandlerMultiplexer> {
        &self.multiplexer
    }

    /// Register a tenant; the first opted-in tenant installs the host hooks
    pub fn register_instance(&self, tenant: Arc<dyn Tenant>, opt_in: bool) -> Result<()> {
        self.registry
            .register_instance(tenant, opt_in, || self.installer.ensure_installed())
    }

    /// Register a tenant using the configured opt-in default
    pub fn register_with_defaults(&self, tenant: Arc<dyn Tenant>) -> Result<()> {
        self.register_instance(tenant, self.config.url_handlers_enabled)
    }

    pub fn unregister_instance(&self, tenant_id: TenantId) -> bool {
        self.registry.unregister_instance(tenant_id)
    }

    pub fn resolve_tenant(&self, caller: &CallerContext) -> TenantLookup {
        self.registry.resolve_tenant(caller)
    }

    pub fn create_scheme_handler(&self, protocol: &str) -> Option<Arc<SchemeResolutionProxy>> {
        self.multiplexer.scheme_proxy(protocol)
    }

    pub fn create_content_handler(&self, mime_type: &str) -> Arc<ContentResolutionProxy> {
        self.multiplexer.content_proxy(mime_type)
    }

    pub fn hooks_installed(&self) -> bool {
        self.installer.is_installed()
    }

    pub fn stats(&self) -> MuxStats {
        MuxStats {
            registry: self.registry.stats(),
            decoder_cache: self.multiplexer.decoder_cache().stats(),
            install_state: self.installer.state(),
        }
    }
}

/// Snapshot of the context for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuxStats {
    pub registry: RegistryStats,
    pub decoder_cache: DecoderCacheStats,
    pub install_state: InstallState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::InProcessHost;
    use crate::tenant::ServiceTenant;

    #[test]
    fn test_opt_out_never_installs() {
        let host = Arc::new(InProcessHost::new());
        let context = MuxContext::new(Arc::clone(&host) as _);

        context
            .register_instance(Arc::new(ServiceTenant::new("quiet")), false)
            .unwrap();
        assert!(!context.hooks_installed());
        assert!(!host.has_scheme_factory());
        assert_eq!(context.stats().registry.registration_count, 1);
        assert_eq!(context.stats().registry.active_tenants, 0);
    }

    #[test]
    fn test_register_with_defaults_follows_config() {
        let host = Arc::new(InProcessHost::new());
        let config = MuxConfig {
            url_handlers_enabled: false,
            ..MuxConfig::default()
        };
        let context = MuxContext::with_config(Arc::clone(&host) as _, config);

        context
            .register_with_defaults(Arc::new(ServiceTenant::new("quiet")))
            .unwrap();
        assert_eq!(context.stats().install_state, InstallState::Uninstalled);
    }

    #[test]
    fn test_first_opt_in_installs_hooks() {
        let host = Arc::new(InProcessHost::new());
        let context = MuxContext::new(Arc::clone(&host) as _);

        context
            .register_instance(Arc::new(ServiceTenant::new("loud")), true)
            .unwrap();
        assert!(context.hooks_installed());
        assert!(host.has_scheme_factory());
        assert!(host.has_content_factory());
        assert!(context.registry().hooks_installed());
    }

    #[test]
    fn test_stats_serialize_for_diagnostics() {
        let context = MuxContext::new(Arc::new(InProcessHost::new()));
        context
            .register_instance(Arc::new(ServiceTenant::new("loud")), true)
            .unwrap();
        let _ = context.create_content_handler("text/plain");

        let json = serde_json::to_value(context.stats()).unwrap();
        assert_eq!(json["registry"]["active_tenants"], 1);
        assert_eq!(json["decoder_cache"]["mime_types"][0], "text/plain");
        assert_eq!(json["install_state"], "Installed");
    }
}
