//! # Handler Multiplexer
//!
//! The single object installed into both host hook slots. It never answers
//! with a concrete tenant handler; it hands out resolution proxies that find
//! the right tenant at the moment of use.
//!
//! Two protocols are decided at creation time rather than deferred:
//!
//! - the local file protocol gets no proxy, so the host's built-in handling
//!   applies;
//! - the inter-tenant protocol gets one process-wide proxy, created on first
//!   request and shared afterwards.

use super::host::{ContentHandlerFactory, SchemeHandlerFactory};
use crate::config::MuxConfig;
use crate::handlers::{ContentDecoder, SchemeHandler};
use crate::registry::{ContentDecoderCache, TenantRegistry};
use crate::resolution::{ContentResolutionProxy, SchemeResolutionProxy};
use std::sync::{Arc, OnceLock};
use tracing::debug;

#[derive(Debug)]
pub struct HandlerMultiplexer {
    registry: Arc<TenantRegistry>,
    decoder_cache: ContentDecoderCache,
    inter_tenant_proxy: OnceLock<Arc<SchemeResolutionProxy>>,
    local_file_protocol: String,
    inter_tenant_protocol: String,
}

impl HandlerMultiplexer {
    pub fn new(registry: Arc<TenantRegistry>, config: &MuxConfig) -> Self {
        Self {
            registry,
            decoder_cache: ContentDecoderCache::new(),
            inter_tenant_proxy: OnceLock::new(),
            local_file_protocol: config.local_file_protocol.to_ascii_lowercase(),
            inter_tenant_protocol: config.inter_tenant_protocol.to_ascii_lowercase(),
        }
    }

    /// Proxy for `protocol`, or `None` for the local file protocol.
    ///
    /// Proxies are not cached here (the host caches per protocol), except
    /// the shared inter-tenant proxy. Every proxy carries the lowercased
    /// protocol.
    pub fn scheme_proxy(&self, protocol: &str) -> Option<Arc<SchemeResolutionProxy>> {
        let protocol = protocol.to_ascii_lowercase();
        if protocol == self.local_file_protocol {
            debug!(protocol = %protocol, "Local file protocol left to host built-in handling");
            return None;
        }

        if protocol == self.inter_tenant_protocol {
            let proxy = self.inter_tenant_proxy.get_or_init(|| {
                debug!(protocol = %protocol, "Creating shared inter-tenant proxy");
                Arc::new(SchemeResolutionProxy::inter_tenant(
                    self.inter_tenant_protocol.clone(),
                    Arc::clone(&self.registry),
                ))
            });
            return Some(Arc::clone(proxy));
        }

        Some(Arc::new(SchemeResolutionProxy::new(
            protocol,
            Arc::clone(&self.registry),
        )))
    }

    /// The cached proxy for `mime_type`, created on first request
    pub fn content_proxy(&self, mime_type: &str) -> Arc<ContentResolutionProxy> {
        self.decoder_cache.get_or_create(mime_type, || {
            ContentResolutionProxy::new(mime_type, Arc::clone(&self.registry))
        })
    }

    pub fn decoder_cache(&self) -> &ContentDecoderCache {
        &self.decoder_cache
    }

    pub fn registry(&self) -> &Arc<TenantRegistry> {
        &self.registry
    }
}

impl SchemeHandlerFactory for HandlerMultiplexer {
    fn create_scheme_handler(&self, protocol: &str) -> Option<Arc<dyn SchemeHandler>> {
        self.scheme_proxy(protocol)
            .map(|proxy| proxy as Arc<dyn SchemeHandler>)
    }
}

impl ContentHandlerFactory for HandlerMultiplexer {
    fn create_content_handler(&self, mime_type: &str) -> Option<Arc<dyn ContentDecoder>> {
        Some(self.content_proxy(mime_type) as Arc<dyn ContentDecoder>)
    }
}
