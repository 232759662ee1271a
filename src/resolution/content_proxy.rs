//! # Content Resolution Proxy
//!
//! The content-decoding counterpart of [`super::SchemeResolutionProxy`].
//! Proxies are cached per mime type by
//! [`crate::registry::ContentDecoderCache`], but the decoder behind one is
//! still looked up on every decode.

use super::caller::CallerContext;
use crate::error::{MuxError, ResolutionTarget, Result, UnavailableReason};
use crate::handlers::{ContentDecoder, ResourceConnection};
use crate::logging::log_resolution;
use crate::registry::TenantRegistry;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct ContentResolutionProxy {
    mime_type: String,
    registry: Arc<TenantRegistry>,
}

impl ContentResolutionProxy {
    pub fn new(mime_type: impl Into<String>, registry: Arc<TenantRegistry>) -> Self {
        Self {
            mime_type: mime_type.into(),
            registry,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Look up the decoder the owning tenant currently publishes
    pub fn resolve(&self, caller: &CallerContext) -> Result<Arc<dyn ContentDecoder>> {
        let target = ResolutionTarget::Content(self.mime_type.clone());

        let tenant = match self.registry.resolve_tenant(caller).into_result() {
            Ok(tenant) => tenant,
            Err(reason) => {
                log_resolution(&target, None, "unavailable", Some(&reason.to_string()));
                return Err(MuxError::content_unavailable(&self.mime_type, reason));
            }
        };

        let tenant_id = tenant.tenant_id();
        match tenant.lookup_content_decoder(&self.mime_type) {
            Some(decoder) => {
                log_resolution(&target, Some(&tenant_id), "resolved", None);
                Ok(decoder)
            }
            None => {
                warn!(
                    mime_type = %self.mime_type,
                    tenant_id = %tenant_id,
                    "Owning tenant has no content decoder for mime type"
                );
                Err(MuxError::ResolutionUnavailable {
                    target,
                    reason: UnavailableReason::NoHandler(tenant_id),
                })
            }
        }
    }
}

impl ContentDecoder for ContentResolutionProxy {
    fn decode(&self, connection: &mut dyn ResourceConnection) -> Result<serde_json::Value> {
        self.resolve(&CallerContext::current())?.decode(connection)
    }
}
