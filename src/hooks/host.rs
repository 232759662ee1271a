//! # Host Runtime Contract
//!
//! The host runtime offers two single-assignment extension points: one
//! factory for scheme handlers and one for content decoders. Setting either
//! a second time is a hard failure on the host's side.
//!
//! [`InProcessHost`] is a reference host: it enforces single assignment,
//! caches scheme handlers per protocol (but not content decoders), and falls
//! back to built-in handlers when the installed factory declines. The
//! multiplexer declines only the local file protocol, so with it installed
//! the built-in decoders never serve.

use super::builtin::{JsonDecoder, LocalFileHandler, PlainTextDecoder};
use crate::constants::{mime, LOCAL_FILE_PROTOCOL};
use crate::error::{HostHook, MuxError, Result};
use crate::handlers::{ContentDecoder, Locator, SchemeHandler};
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Produces scheme handlers for the host
pub trait SchemeHandlerFactory: Send + Sync {
    /// `None` lets the host use its built-in handling
    fn create_scheme_handler(&self, protocol: &str) -> Option<Arc<dyn SchemeHandler>>;
}

/// Produces content decoders for the host
pub trait ContentHandlerFactory: Send + Sync {
    fn create_content_handler(&self, mime_type: &str) -> Option<Arc<dyn ContentDecoder>>;
}

/// The two process-wide hook slots
pub trait HostRuntime: Send + Sync {
    fn set_scheme_handler_factory(&self, factory: Arc<dyn SchemeHandlerFactory>) -> Result<()>;

    fn set_content_handler_factory(&self, factory: Arc<dyn ContentHandlerFactory>) -> Result<()>;
}

#[derive(Default)]
pub struct InProcessHost {
    scheme_factory: OnceLock<Arc<dyn SchemeHandlerFactory>>,
    content_factory: OnceLock<Arc<dyn ContentHandlerFactory>>,
    scheme_cache: DashMap<String, Arc<dyn SchemeHandler>>,
    builtin_schemes: DashMap<String, Arc<dyn SchemeHandler>>,
    builtin_decoders: DashMap<String, Arc<dyn ContentDecoder>>,
}

impl fmt::Debug for InProcessHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcessHost")
            .field("scheme_factory_set", &self.scheme_factory.get().is_some())
            .field("content_factory_set", &self.content_factory.get().is_some())
            .field("cached_schemes", &self.scheme_cache.len())
            .field("builtin_schemes", &self.builtin_schemes.len())
            .field("builtin_decoders", &self.builtin_decoders.len())
            .finish()
    }
}

impl InProcessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with the local file protocol and plain text / JSON decoding built in.
    ///
    /// The built-in decoders only serve while no content factory is set. The
    /// multiplexer answers every mime type with a proxy, so once it is
    /// installed all decoding goes through tenants.
    pub fn with_builtins() -> Self {
        let host = Self::new();
        host.register_builtin_scheme(LOCAL_FILE_PROTOCOL, Arc::new(LocalFileHandler));
        host.register_builtin_decoder(mime::TEXT_PLAIN, Arc::new(PlainTextDecoder));
        host.register_builtin_decoder(mime::APPLICATION_JSON, Arc::new(JsonDecoder));
        host
    }

    pub fn register_builtin_scheme(&self, protocol: &str, handler: Arc<dyn SchemeHandler>) {
        self.builtin_schemes
            .insert(protocol.to_ascii_lowercase(), handler);
    }

    /// Fallback decoder used when no content factory is set or the factory
    /// declines `mime_type`
    pub fn register_builtin_decoder(&self, mime_type: &str, decoder: Arc<dyn ContentDecoder>) {
        self.builtin_decoders.insert(mime_type.to_string(), decoder);
    }

    pub fn has_scheme_factory(&self) -> bool {
        self.scheme_factory.get().is_some()
    }

    pub fn has_content_factory(&self) -> bool {
        self.content_factory.get().is_some()
    }

    /// Handler for `protocol`, asking the installed factory once per
    /// protocol and caching whatever handler results
    pub fn scheme_handler(&self, protocol: &str) -> Option<Arc<dyn SchemeHandler>> {
        let key = protocol.to_ascii_lowercase();
        if let Some(cached) = self.scheme_cache.get(&key) {
            return Some(Arc::clone(cached.value()));
        }

        let handler = self
            .scheme_factory
            .get()
            .and_then(|factory| factory.create_scheme_handler(&key))
            .or_else(|| {
                self.builtin_schemes
                    .get(&key)
                    .map(|entry| Arc::clone(entry.value()))
            })?;

        debug!(protocol = %key, "Caching scheme handler");
        Some(Arc::clone(
            self.scheme_cache.entry(key).or_insert(handler).value(),
        ))
    }

    /// Decoder for `mime_type`; asks the installed factory on every call and
    /// falls back to a built-in only when the factory declines
    pub fn content_handler(&self, mime_type: &str) -> Option<Arc<dyn ContentDecoder>> {
        self.content_factory
            .get()
            .and_then(|factory| factory.create_content_handler(mime_type))
            .or_else(|| {
                self.builtin_decoders
                    .get(mime_type)
                    .map(|entry| Arc::clone(entry.value()))
            })
    }

    pub fn cached_protocols(&self) -> Vec<String> {
        let mut protocols: Vec<String> = self
            .scheme_cache
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        protocols.sort();
        protocols
    }

    /// Open `spec` and decode its content by the connection's content type
    pub fn fetch(&self, spec: &str) -> Result<serde_json::Value> {
        let protocol = Locator::protocol_of(spec)?.to_ascii_lowercase();
        let handler = self
            .scheme_handler(&protocol)
            .ok_or_else(|| MuxError::UnknownProtocol(protocol.clone()))?;

        let locator = handler.parse_locator(spec)?;
        let mut connection = handler.open_connection(&locator)?;

        let content_type = connection
            .content_type()
            .unwrap_or(mime::OCTET_STREAM)
            .to_string();
        let decoder = self
            .content_handler(&content_type)
            .ok_or_else(|| MuxError::UnknownContentType(content_type.clone()))?;

        decoder.decode(connection.as_mut())
    }
}

impl HostRuntime for InProcessHost {
    fn set_scheme_handler_factory(&self, factory: Arc<dyn SchemeHandlerFactory>) -> Result<()> {
        self.scheme_factory
            .set(factory)
            .map_err(|_| MuxError::HookAlreadySet(HostHook::SchemeFactory))
    }

    fn set_content_handler_factory(&self, factory: Arc<dyn ContentHandlerFactory>) -> Result<()> {
        self.content_factory
            .set(factory)
            .map_err(|_| MuxError::HookAlreadySet(HostHook::ContentFactory))
    }
}
