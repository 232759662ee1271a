//! # Tenant Registry
//!
//! Tracks the tenants currently served by the multiplexer and whether the
//! host hooks have gone live.
//!
//! ## State
//!
//! - active tenants in registration order (duplicates are accepted)
//! - a count of every registration, opted in or not
//! - a hooks-installed flag that never reverts
//!
//! ## Resolution order
//!
//! ```text
//! resolve_tenant(caller)
//!   ├── no active tenants            -> NoActiveTenant
//!   ├── explicit tenant token        -> that tenant if active, else NoOwningTenant
//!   ├── one active, one registration -> that tenant (no chain inspection)
//!   └── TenantIdentifier over chain  -> owner, else NoOwningTenant
//! ```
//!
//! Chain inspection runs on a snapshot taken outside the registry lock, so
//! tenant ownership predicates never execute while registration is blocked.

use crate::error::{Result, UnavailableReason};
use crate::logging::log_registry_operation;
use crate::resolution::{CallerContext, TenantIdentifier};
use crate::tenant::{Tenant, TenantId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of identifying the tenant behind a request
#[derive(Debug, Clone)]
pub enum TenantLookup {
    Found(Arc<dyn Tenant>),
    NoActiveTenant,
    NoOwningTenant,
}

impl TenantLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, TenantLookup::Found(_))
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            TenantLookup::Found(tenant) => Some(tenant.tenant_id()),
            _ => None,
        }
    }

    pub fn into_tenant(self) -> Option<Arc<dyn Tenant>> {
        match self {
            TenantLookup::Found(tenant) => Some(tenant),
            _ => None,
        }
    }

    pub fn into_result(self) -> std::result::Result<Arc<dyn Tenant>, UnavailableReason> {
        match self {
            TenantLookup::Found(tenant) => Ok(tenant),
            TenantLookup::NoActiveTenant => Err(UnavailableReason::NoActiveTenant),
            TenantLookup::NoOwningTenant => Err(UnavailableReason::NoOwningTenant),
        }
    }
}

/// An active tenant with the id it reported at registration, so the lock
/// never calls back into tenant code
#[derive(Debug, Clone)]
struct ActiveTenant {
    id: TenantId,
    tenant: Arc<dyn Tenant>,
}

#[derive(Debug, Default)]
struct RegistryState {
    tenants: Vec<ActiveTenant>,
    registration_count: usize,
    opt_in_registrations: u64,
    hooks_installed: bool,
}

/// Registry of tenants sharing the process-wide hooks
#[derive(Debug, Default)]
pub struct TenantRegistry {
    state: Mutex<RegistryState>,
    identifier: TenantIdentifier,
    chain_inspections: AtomicU64,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant.
    ///
    /// Every call counts toward the registration count. Only opted-in tenants
    /// join the active list, and the first of them runs `install_hooks`
    /// before joining. If installation fails the registration leaves no
    /// trace.
    pub fn register_instance<F>(
        &self,
        tenant: Arc<dyn Tenant>,
        opt_in: bool,
        install_hooks: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let tenant_id = tenant.tenant_id();
        let mut state = self.state.lock();

        if opt_in {
            if !state.hooks_installed {
                install_hooks()?;
                state.hooks_installed = true;
                info!(tenant_id = %tenant_id, "Host hooks installed by first opted-in tenant");
            }
            state.tenants.push(ActiveTenant {
                id: tenant_id,
                tenant,
            });
            state.opt_in_registrations += 1;
        }
        state.registration_count += 1;

        let details = format!(
            "opt_in={opt_in} active={} registrations={}",
            state.tenants.len(),
            state.registration_count
        );
        drop(state);

        log_registry_operation("register", Some(&tenant_id), "success", Some(&details));
        Ok(())
    }

    /// Unregister a tenant. Removes its first active entry if present;
    /// returns whether an entry was removed.
    pub fn unregister_instance(&self, tenant_id: TenantId) -> bool {
        let mut state = self.state.lock();
        state.registration_count = state.registration_count.saturating_sub(1);

        let removed = match state
            .tenants
            .iter()
            .position(|active| active.id == tenant_id)
        {
            Some(index) => {
                state.tenants.remove(index);
                true
            }
            None => false,
        };

        let details = format!(
            "removed={removed} active={} registrations={}",
            state.tenants.len(),
            state.registration_count
        );
        drop(state);

        log_registry_operation("unregister", Some(&tenant_id), "success", Some(&details));
        removed
    }

    pub fn resolve_tenant(&self, caller: &CallerContext) -> TenantLookup {
        let snapshot = {
            let state = self.state.lock();

            if state.tenants.is_empty() {
                return TenantLookup::NoActiveTenant;
            }

            if let Some(requested) = caller.tenant {
                return state
                    .tenants
                    .iter()
                    .find(|active| active.id == requested)
                    .map(|active| TenantLookup::Found(Arc::clone(&active.tenant)))
                    .unwrap_or(TenantLookup::NoOwningTenant);
            }

            if state.tenants.len() == 1 && state.registration_count == 1 {
                return TenantLookup::Found(Arc::clone(&state.tenants[0].tenant));
            }

            state
                .tenants
                .iter()
                .map(|active| Arc::clone(&active.tenant))
                .collect::<Vec<_>>()
        };

        self.chain_inspections.fetch_add(1, Ordering::Relaxed);
        match self.identifier.owning_frame(&snapshot, &caller.chain) {
            Some(frame) => {
                debug!(
                    tenant_id = %frame.tenant.tenant_id(),
                    depth = frame.depth,
                    active = snapshot.len(),
                    "Tenant identified from call chain"
                );
                TenantLookup::Found(frame.tenant)
            }
            None => {
                debug!(
                    frames = caller.chain.len(),
                    active = snapshot.len(),
                    "No active tenant owns any frame of the call chain"
                );
                TenantLookup::NoOwningTenant
            }
        }
    }

    pub fn active_tenants(&self) -> Vec<Arc<dyn Tenant>> {
        self.state
            .lock()
            .tenants
            .iter()
            .map(|active| Arc::clone(&active.tenant))
            .collect()
    }

    pub fn is_active(&self, tenant_id: TenantId) -> bool {
        self.state
            .lock()
            .tenants
            .iter()
            .any(|active| active.id == tenant_id)
    }

    pub fn hooks_installed(&self) -> bool {
        self.state.lock().hooks_installed
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.state.lock();
        RegistryStats {
            active_tenants: state.tenants.len(),
            registration_count: state.registration_count,
            opt_in_registrations: state.opt_in_registrations,
            hooks_installed: state.hooks_installed,
            chain_inspections: self.chain_inspections.load(Ordering::Relaxed),
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub active_tenants: usize,
    pub registration_count: usize,
    pub opt_in_registrations: u64,
    pub hooks_installed: bool,
    pub chain_inspections: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MuxError;
    use crate::resolution::CallChain;
    use crate::tenant::ServiceTenant;
    use std::sync::atomic::AtomicUsize;

    fn tenant(name: &str, unit: &str) -> Arc<dyn Tenant> {
        Arc::new(ServiceTenant::new(name).with_code_unit(unit))
    }

    fn no_install() -> Result<()> {
        Ok(())
    }

    /// Counts how often the registry asks for its id
    #[derive(Debug)]
    struct IdCountingTenant {
        id: TenantId,
        id_calls: AtomicUsize,
    }

    impl Tenant for IdCountingTenant {
        fn tenant_id(&self) -> TenantId {
            self.id_calls.fetch_add(1, Ordering::SeqCst);
            self.id
        }

        fn owns_code_unit(&self, _unit: &crate::tenant::CodeUnitId) -> bool {
            false
        }

        fn lookup_scheme_handler(
            &self,
            _protocol: &str,
        ) -> Option<Arc<dyn crate::handlers::SchemeHandler>> {
            None
        }

        fn lookup_content_decoder(
            &self,
            _mime_type: &str,
        ) -> Option<Arc<dyn crate::handlers::ContentDecoder>> {
            None
        }
    }

    #[test]
    fn test_tenant_id_read_once_at_registration() {
        let registry = TenantRegistry::new();
        let counting = Arc::new(IdCountingTenant {
            id: TenantId::new(),
            id_calls: AtomicUsize::new(0),
        });
        let id = counting.id;

        registry
            .register_instance(Arc::clone(&counting) as Arc<dyn Tenant>, true, no_install)
            .unwrap();
        registry
            .register_instance(tenant("other", "other.core"), true, no_install)
            .unwrap();
        assert_eq!(counting.id_calls.load(Ordering::SeqCst), 1);

        let lookup = registry.resolve_tenant(&CallerContext::for_tenant(id));
        assert!(lookup.is_found());
        assert!(registry.is_active(id));
        assert!(registry.unregister_instance(id));
        assert_eq!(counting.id_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_opt_in_installs_once() {
        let registry = TenantRegistry::new();
        let installs = AtomicUsize::new(0);
        let install = || {
            installs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        registry.register_instance(tenant("a", "a"), false, install).unwrap();
        assert_eq!(installs.load(Ordering::SeqCst), 0);
        assert!(!registry.hooks_installed());

        registry.register_instance(tenant("b", "b"), true, install).unwrap();
        registry.register_instance(tenant("c", "c"), true, install).unwrap();
        assert_eq!(installs.load(Ordering::SeqCst), 1);
        assert!(registry.hooks_installed());

        let stats = registry.stats();
        assert_eq!(stats.active_tenants, 2);
        assert_eq!(stats.registration_count, 3);
        assert_eq!(stats.opt_in_registrations, 2);
    }

    #[test]
    fn test_failed_install_leaves_no_trace() {
        let registry = TenantRegistry::new();
        let result = registry.register_instance(tenant("a", "a"), true, || {
            Err(MuxError::HookInstallationFailed("rejected".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(registry.stats(), RegistryStats::default());
    }

    #[test]
    fn test_hooks_stay_installed_after_all_unregister() {
        let registry = TenantRegistry::new();
        let alpha = tenant("a", "a");
        let alpha_id = alpha.tenant_id();

        registry.register_instance(alpha, true, no_install).unwrap();
        assert!(registry.unregister_instance(alpha_id));
        assert!(registry.hooks_installed());
        assert!(registry.active_tenants().is_empty());
    }

    #[test]
    fn test_duplicate_registration_is_accepted() {
        let registry = TenantRegistry::new();
        let alpha = tenant("a", "a");
        let alpha_id = alpha.tenant_id();

        registry.register_instance(Arc::clone(&alpha), true, no_install).unwrap();
        registry.register_instance(alpha, true, no_install).unwrap();
        assert_eq!(registry.stats().active_tenants, 2);

        assert!(registry.unregister_instance(alpha_id));
        assert!(registry.is_active(alpha_id));
        assert!(registry.unregister_instance(alpha_id));
        assert!(!registry.is_active(alpha_id));
    }

    #[test]
    fn test_unregister_absent_tenant_is_noop() {
        let registry = TenantRegistry::new();
        assert!(!registry.unregister_instance(TenantId::new()));
        assert_eq!(registry.stats().registration_count, 0);
    }

    #[test]
    fn test_fast_path_skips_chain_inspection() {
        let registry = TenantRegistry::new();
        let alpha = tenant("a", "alpha.core");
        registry.register_instance(Arc::clone(&alpha), true, no_install).unwrap();

        let caller = CallerContext::from_chain(CallChain::new(["unrelated.code"]));
        let lookup = registry.resolve_tenant(&caller);
        assert_eq!(lookup.tenant_id(), Some(alpha.tenant_id()));
        assert_eq!(registry.stats().chain_inspections, 0);
    }

    #[test]
    fn test_opted_out_registration_disables_fast_path() {
        let registry = TenantRegistry::new();
        let alpha = tenant("a", "alpha.core");
        registry.register_instance(Arc::clone(&alpha), true, no_install).unwrap();
        registry.register_instance(tenant("b", "beta.core"), false, no_install).unwrap();

        let caller = CallerContext::from_chain(CallChain::new(["unrelated.code"]));
        assert!(matches!(registry.resolve_tenant(&caller), TenantLookup::NoOwningTenant));

        let caller = CallerContext::from_chain(CallChain::new(["alpha.core"]));
        assert_eq!(registry.resolve_tenant(&caller).tenant_id(), Some(alpha.tenant_id()));
        assert_eq!(registry.stats().chain_inspections, 2);
    }

    #[test]
    fn test_empty_registry_has_no_tenant() {
        let registry = TenantRegistry::new();
        let caller = CallerContext::from_chain(CallChain::new(["alpha.core"]));
        assert!(matches!(registry.resolve_tenant(&caller), TenantLookup::NoActiveTenant));
    }

    #[test]
    fn test_explicit_token_takes_precedence() {
        let registry = TenantRegistry::new();
        let alpha = tenant("a", "alpha.core");
        let beta = tenant("b", "beta.core");
        registry.register_instance(Arc::clone(&alpha), true, no_install).unwrap();
        registry.register_instance(Arc::clone(&beta), true, no_install).unwrap();

        let caller = CallerContext::from_chain(CallChain::new(["alpha.core"]))
            .with_tenant(beta.tenant_id());
        assert_eq!(registry.resolve_tenant(&caller).tenant_id(), Some(beta.tenant_id()));

        let caller = CallerContext::for_tenant(TenantId::new());
        assert!(matches!(registry.resolve_tenant(&caller), TenantLookup::NoOwningTenant));
        assert_eq!(registry.stats().chain_inspections, 0);
    }
}
