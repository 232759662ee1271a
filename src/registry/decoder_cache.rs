//! # Content Decoder Cache
//!
//! Memoizes mime type -> content resolution proxy. The host runtime caches
//! scheme handlers itself but not content handlers, so this is the only
//! cache in the multiplexer.
//!
//! Entries are created once and never replaced; only the tenant decoder a
//! proxy resolves to changes over time. The check-then-insert runs inside a
//! single critical section so concurrent first access for one mime type
//! still yields exactly one proxy.

use crate::resolution::ContentResolutionProxy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ContentDecoderCache {
    proxies: Mutex<HashMap<String, Arc<ContentResolutionProxy>>>,
}

impl ContentDecoderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached proxy for `mime_type`, creating it with `create` on
    /// first access
    pub fn get_or_create<F>(&self, mime_type: &str, create: F) -> Arc<ContentResolutionProxy>
    where
        F: FnOnce() -> ContentResolutionProxy,
    {
        let mut proxies = self.proxies.lock();
        if let Some(proxy) = proxies.get(mime_type) {
            return Arc::clone(proxy);
        }

        let proxy = Arc::new(create());
        proxies.insert(mime_type.to_string(), Arc::clone(&proxy));
        debug!(mime_type = %mime_type, cached = proxies.len(), "Cached new content resolution proxy");
        proxy
    }

    pub fn get(&self, mime_type: &str) -> Option<Arc<ContentResolutionProxy>> {
        self.proxies.lock().get(mime_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.proxies.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.lock().is_empty()
    }

    pub fn stats(&self) -> DecoderCacheStats {
        let proxies = self.proxies.lock();
        let mut mime_types: Vec<String> = proxies.keys().cloned().collect();
        mime_types.sort();
        DecoderCacheStats {
            cached_proxies: proxies.len(),
            mime_types,
        }
    }
}

/// Statistics about the content decoder cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderCacheStats {
    pub cached_proxies: usize,
    pub mime_types: Vec<String>,
}
