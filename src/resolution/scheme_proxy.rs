//! # Scheme Resolution Proxy
//!
//! Stands in for "the handler for protocol P" before any tenant has
//! published one. The host runtime caches whatever its factory returns per
//! protocol and never asks again, so the multiplexer always hands out a
//! proxy and defers the real lookup.
//!
//! A proxy holds only its protocol and a registry reference. Every
//! top-level operation re-resolves the owning tenant and asks it for a
//! handler; nothing resolved is kept. A handler that appears, changes or
//! disappears later is therefore honored on the next call.

use super::caller::CallerContext;
use crate::error::{MuxError, ResolutionTarget, Result, UnavailableReason};
use crate::handlers::{Locator, ResourceConnection, SchemeHandler};
use crate::logging::log_resolution;
use crate::registry::TenantRegistry;
use crate::tenant::TenantId;
use std::sync::Arc;
use tracing::warn;

/// Which tenants a proxy may resolve against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyScope {
    /// The tenant owning the calling code
    TenantScoped,
    /// Any tenant; a locator whose host is a tenant id selects that tenant
    InterTenant,
}

#[derive(Debug)]
pub struct SchemeResolutionProxy {
    protocol: String,
    scope: ProxyScope,
    registry: Arc<TenantRegistry>,
}

impl SchemeResolutionProxy {
    pub fn new(protocol: impl Into<String>, registry: Arc<TenantRegistry>) -> Self {
        Self {
            protocol: protocol.into(),
            scope: ProxyScope::TenantScoped,
            registry,
        }
    }

    pub fn inter_tenant(protocol: impl Into<String>, registry: Arc<TenantRegistry>) -> Self {
        Self {
            protocol: protocol.into(),
            scope: ProxyScope::InterTenant,
            registry,
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn scope(&self) -> ProxyScope {
        self.scope
    }

    /// Look up the handler the owning tenant currently publishes
    pub fn resolve(&self, caller: &CallerContext) -> Result<Arc<dyn SchemeHandler>> {
        let target = ResolutionTarget::Scheme(self.protocol.clone());

        let tenant = match self.registry.resolve_tenant(caller).into_result() {
            Ok(tenant) => tenant,
            Err(reason) => {
                log_resolution(&target, None, "unavailable", Some(&reason.to_string()));
                return Err(MuxError::scheme_unavailable(&self.protocol, reason));
            }
        };

        let tenant_id = tenant.tenant_id();
        match tenant.lookup_scheme_handler(&self.protocol) {
            Some(handler) => {
                log_resolution(&target, Some(&tenant_id), "resolved", None);
                Ok(handler)
            }
            None => {
                warn!(
                    protocol = %self.protocol,
                    tenant_id = %tenant_id,
                    "Owning tenant has no scheme handler for protocol"
                );
                Err(MuxError::ResolutionUnavailable {
                    target,
                    reason: UnavailableReason::NoHandler(tenant_id),
                })
            }
        }
    }

    fn caller_for(&self, locator: &Locator) -> CallerContext {
        let caller = CallerContext::current();
        if self.scope != ProxyScope::InterTenant {
            return caller;
        }
        match locator.host.as_deref().and_then(TenantId::parse) {
            Some(tenant_id) => caller.with_tenant(tenant_id),
            None => caller,
        }
    }
}

impl SchemeHandler for SchemeResolutionProxy {
    fn open_connection(&self, locator: &Locator) -> Result<Box<dyn ResourceConnection>> {
        self.resolve(&self.caller_for(locator))?
            .open_connection(locator)
    }

    fn parse_locator(&self, spec: &str) -> Result<Locator> {
        let caller = match (self.scope, Locator::parse(spec)) {
            (ProxyScope::InterTenant, Ok(provisional)) => self.caller_for(&provisional),
            _ => CallerContext::current(),
        };
        self.resolve(&caller)?.parse_locator(spec)
    }

    fn to_external_form(&self, locator: &Locator) -> Result<String> {
        self.resolve(&self.caller_for(locator))?
            .to_external_form(locator)
    }

    fn default_port(&self) -> Result<Option<u16>> {
        self.resolve(&CallerContext::current())?.default_port()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::BufferedConnection;
    use crate::resolution::caller::{enter_code_unit, enter_tenant_scope};
    use crate::tenant::{ServiceTenant, Tenant};

    #[derive(Debug)]
    struct TaggedHandler(&'static str);

    impl SchemeHandler for TaggedHandler {
        fn open_connection(&self, locator: &Locator) -> Result<Box<dyn ResourceConnection>> {
            Ok(Box::new(BufferedConnection::new(
                locator.clone(),
                Some("text/plain".to_string()),
                self.0,
            )))
        }

        fn default_port(&self) -> Result<Option<u16>> {
            Ok(Some(7070))
        }
    }

    fn read(mut connection: Box<dyn ResourceConnection>) -> String {
        String::from_utf8(connection.read_to_end().unwrap()).unwrap()
    }

    fn registry_with(tenants: &[Arc<ServiceTenant>]) -> Arc<TenantRegistry> {
        let registry = Arc::new(TenantRegistry::new());
        for tenant in tenants {
            registry
                .register_instance(Arc::clone(tenant) as Arc<dyn Tenant>, true, || Ok(()))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_construction_never_fails() {
        let proxy = SchemeResolutionProxy::new("acme", Arc::new(TenantRegistry::new()));
        assert_eq!(proxy.protocol(), "acme");
        assert_eq!(proxy.scope(), ProxyScope::TenantScoped);

        let err = proxy.default_port().unwrap_err();
        assert_eq!(err.unavailable_reason(), Some(UnavailableReason::NoActiveTenant));
    }

    #[test]
    fn test_handler_published_after_first_use_is_honored() {
        let alpha = Arc::new(ServiceTenant::new("alpha"));
        let registry = registry_with(&[Arc::clone(&alpha)]);
        let proxy = SchemeResolutionProxy::new("acme", registry);
        let locator = Locator::parse("acme://host/x").unwrap();

        let err = proxy.open_connection(&locator).unwrap_err();
        assert_eq!(
            err.unavailable_reason(),
            Some(UnavailableReason::NoHandler(alpha.tenant_id()))
        );

        alpha.publish_scheme_handler("acme", Arc::new(TaggedHandler("v1")));
        assert_eq!(read(proxy.open_connection(&locator).unwrap()), "v1");
        assert_eq!(proxy.default_port().unwrap(), Some(7070));

        alpha.publish_scheme_handler("acme", Arc::new(TaggedHandler("v2")));
        assert_eq!(read(proxy.open_connection(&locator).unwrap()), "v2");

        alpha.withdraw_scheme_handler("acme");
        assert!(proxy.open_connection(&locator).unwrap_err().is_resolution_unavailable());
    }

    #[test]
    fn test_resolves_against_calling_tenant() {
        let alpha = Arc::new(ServiceTenant::new("alpha").with_code_unit("alpha.core"));
        let beta = Arc::new(ServiceTenant::new("beta").with_code_unit("beta.core"));
        alpha.publish_scheme_handler("acme", Arc::new(TaggedHandler("alpha")));
        beta.publish_scheme_handler("acme", Arc::new(TaggedHandler("beta")));

        let registry = registry_with(&[Arc::clone(&beta), Arc::clone(&alpha)]);
        let proxy = SchemeResolutionProxy::new("acme", registry);
        let locator = Locator::parse("acme://host/x").unwrap();

        {
            let _frame = enter_code_unit("alpha.core");
            assert_eq!(read(proxy.open_connection(&locator).unwrap()), "alpha");
        }
        {
            let _frame = enter_code_unit("beta.core");
            assert_eq!(read(proxy.open_connection(&locator).unwrap()), "beta");
        }

        let err = proxy.open_connection(&locator).unwrap_err();
        assert_eq!(err.unavailable_reason(), Some(UnavailableReason::NoOwningTenant));

        let _scope = enter_tenant_scope(beta.tenant_id());
        assert_eq!(read(proxy.open_connection(&locator).unwrap()), "beta");
    }

    #[test]
    fn test_inter_tenant_locator_selects_tenant() {
        let alpha = Arc::new(ServiceTenant::new("alpha"));
        let beta = Arc::new(ServiceTenant::new("beta"));
        alpha.publish_scheme_handler("bundle", Arc::new(TaggedHandler("alpha")));
        beta.publish_scheme_handler("bundle", Arc::new(TaggedHandler("beta")));

        let registry = registry_with(&[Arc::clone(&alpha), Arc::clone(&beta)]);
        let proxy = SchemeResolutionProxy::inter_tenant("bundle", registry);

        let locator = Locator::parse(&format!("bundle://{}/res.txt", beta.tenant_id())).unwrap();
        assert_eq!(read(proxy.open_connection(&locator).unwrap()), "beta");

        let locator = Locator::parse(&format!("bundle://{}/res.txt", alpha.tenant_id())).unwrap();
        assert_eq!(read(proxy.open_connection(&locator).unwrap()), "alpha");

        let locator = Locator::parse("bundle://not-a-tenant/res.txt").unwrap();
        assert!(proxy.open_connection(&locator).is_err());
    }
}
