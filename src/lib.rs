#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Handler Mux Core
//!
//! Shares a host runtime's one-time-settable scheme-resolution and
//! content-decoding hooks among any number of independently lifecycled
//! tenants in the same process.
//!
//! ## Overview
//!
//! The host permits installing exactly one scheme handler factory and one
//! content handler factory, and never allows replacing either. This crate
//! installs a single multiplexer into both slots the first time a tenant
//! opts in, then routes every request to whichever tenant owns it at the
//! moment of use. Tenants come and go without the hooks ever being touched
//! again.
//!
//! ## Architecture
//!
//! ```text
//! MuxContext
//! ├── TenantRegistry          (active tenants, registration count, hook flag)
//! ├── HandlerMultiplexer      (installed into the host hook slots)
//! │   ├── SchemeResolutionProxy    (fresh per request, shared for the inter-tenant protocol)
//! │   └── ContentDecoderCache      (one ContentResolutionProxy per mime type)
//! └── GlobalHookInstaller     (install-once guard)
//! ```
//!
//! Proxies never fail on construction. Only an operation that needs a real
//! handler can fail, and it fails with
//! [`MuxError::ResolutionUnavailable`] so callers can tell "nothing there
//! yet" from a broken system.
//!
//! ## Module Organization
//!
//! - [`tenant`] - Tenant contract and a service-table-backed tenant
//! - [`handlers`] - Scheme handler, content decoder and locator types
//! - [`registry`] - Tenant registry and content decoder cache
//! - [`resolution`] - Lazy proxies, caller context, tenant identification
//! - [`hooks`] - Host hook contract, multiplexer, installer
//! - [`context`] - Process-scoped context object
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use handler_mux::hooks::InProcessHost;
//! use handler_mux::tenant::ServiceTenant;
//! use handler_mux::MuxContext;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let host = Arc::new(InProcessHost::with_builtins());
//! let context = MuxContext::new(host.clone());
//!
//! let tenant = Arc::new(ServiceTenant::new("orders").with_code_unit("orders.api"));
//! context.register_instance(tenant.clone(), true)?;
//!
//! // Resolution now flows through the host
//! let handler = host.scheme_handler("acme");
//! assert!(handler.is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod handlers;
pub mod hooks;
pub mod logging;
pub mod registry;
pub mod resolution;
pub mod tenant;

pub use config::MuxConfig;
pub use context::{MuxContext, MuxStats};
pub use error::{MuxError, ResolutionTarget, Result, UnavailableReason};
pub use registry::{TenantLookup, TenantRegistry};
pub use resolution::{CallChain, CallerContext};
pub use tenant::{CodeUnitId, ServiceTenant, Tenant, TenantId};
