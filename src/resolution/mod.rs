//! # Resolution
//!
//! Lazy proxies handed to the host runtime, and the machinery that works out
//! which tenant a request belongs to.
//!
//! ```text
//! host runtime ──► SchemeResolutionProxy / ContentResolutionProxy
//!                          │ (every operation)
//!                          ▼
//!                  TenantRegistry::resolve_tenant(CallerContext)
//!                          │ explicit token / fast path / TenantIdentifier
//!                          ▼
//!                  Tenant::lookup_scheme_handler / lookup_content_decoder
//! ```

pub mod caller;
pub mod content_proxy;
pub mod identifier;
pub mod scheme_proxy;

pub use caller::{
    enter_code_unit, enter_tenant_scope, CallChain, CallerContext, FrameGuard, TenantScopeGuard,
};
pub use content_proxy::ContentResolutionProxy;
pub use identifier::{OwningFrame, TenantIdentifier};
pub use scheme_proxy::{ProxyScope, SchemeResolutionProxy};
