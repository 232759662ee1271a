//! # Tenant Identifier
//!
//! Resolves which tenant a request belongs to when the registry cannot tell
//! on its own. The chain is walked innermost-first and the first frame any
//! tenant claims decides the owner; within one frame, registration order
//! decides. Two tenants claiming the same code unit is a host
//! misconfiguration and is not disambiguated further.

use super::caller::CallChain;
use crate::tenant::Tenant;
use std::sync::Arc;
use tracing::trace;

/// A frame matched to its owning tenant
#[derive(Debug, Clone)]
pub struct OwningFrame {
    /// Position in the chain, 0 being innermost
    pub depth: usize,
    pub tenant: Arc<dyn Tenant>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TenantIdentifier;

impl TenantIdentifier {
    pub fn new() -> Self {
        Self
    }

    pub fn owning_frame(&self, tenants: &[Arc<dyn Tenant>], chain: &CallChain) -> Option<OwningFrame> {
        for (depth, unit) in chain.frames().iter().enumerate() {
            if let Some(tenant) = tenants.iter().find(|tenant| tenant.owns_code_unit(unit)) {
                trace!(
                    code_unit = %unit,
                    depth = depth,
                    tenant_id = %tenant.tenant_id(),
                    "Frame matched to owning tenant"
                );
                return Some(OwningFrame {
                    depth,
                    tenant: Arc::clone(tenant),
                });
            }
        }
        None
    }

    pub fn identify(&self, tenants: &[Arc<dyn Tenant>], chain: &CallChain) -> Option<Arc<dyn Tenant>> {
        self.owning_frame(tenants, chain).map(|frame| frame.tenant)
    }
}
