//! # Registry Infrastructure
//!
//! Shared state behind the multiplexer, guarded by two independent locks
//! that are never nested:
//!
//! ```text
//! Registry Infrastructure
//! ├── TenantRegistry       (registration, hook-installed flag, tenant resolution)
//! └── ContentDecoderCache  (mime type -> content proxy)
//! ```

pub mod decoder_cache;
pub mod tenant_registry;

pub use decoder_cache::{ContentDecoderCache, DecoderCacheStats};
pub use tenant_registry::{RegistryStats, TenantLookup, TenantRegistry};
