//! Shared fixtures for multiplexer integration tests.
#![allow(dead_code)]

use handler_mux::error::Result;
use handler_mux::handlers::{
    BufferedConnection, ContentDecoder, Locator, ResourceConnection, SchemeHandler,
};
use handler_mux::hooks::{ContentHandlerFactory, HostRuntime, InProcessHost, SchemeHandlerFactory};
use handler_mux::{MuxContext, ServiceTenant};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const ACME_MIME: &str = "application/x-acme";

/// Scheme handler serving a fixed body tagged with its owner
#[derive(Debug)]
pub struct TaggedSchemeHandler {
    pub tag: String,
}

impl TaggedSchemeHandler {
    pub fn new(tag: &str) -> Arc<Self> {
        Arc::new(Self {
            tag: tag.to_string(),
        })
    }
}

impl SchemeHandler for TaggedSchemeHandler {
    fn open_connection(&self, locator: &Locator) -> Result<Box<dyn ResourceConnection>> {
        let body = serde_json::json!({ "owner": self.tag, "path": locator.path }).to_string();
        Ok(Box::new(BufferedConnection::new(
            locator.clone(),
            Some(ACME_MIME.to_string()),
            body,
        )))
    }
}

/// Decodes JSON bodies and stamps the decoding tenant onto the result
#[derive(Debug)]
pub struct StampingDecoder {
    pub tag: String,
}

impl StampingDecoder {
    pub fn new(tag: &str) -> Arc<Self> {
        Arc::new(Self {
            tag: tag.to_string(),
        })
    }
}

impl ContentDecoder for StampingDecoder {
    fn decode(&self, connection: &mut dyn ResourceConnection) -> Result<serde_json::Value> {
        let bytes = connection.read_to_end()?;
        let mut value: serde_json::Value = serde_json::from_slice(&bytes)?;
        value["decoded_by"] = serde_json::Value::String(self.tag.clone());
        Ok(value)
    }
}

/// A tenant publishing the `acme` protocol and its mime type
pub fn acme_tenant(name: &str, code_unit: &str) -> Arc<ServiceTenant> {
    let tenant = Arc::new(ServiceTenant::new(name).with_code_unit(code_unit));
    tenant.publish_scheme_handler("acme", TaggedSchemeHandler::new(name));
    tenant.publish_content_decoder(ACME_MIME, StampingDecoder::new(name));
    tenant
}

/// Host wrapper counting hook installation attempts
#[derive(Debug, Default)]
pub struct CountingHost {
    pub inner: InProcessHost,
    pub attempts: AtomicUsize,
}

impl CountingHost {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl HostRuntime for CountingHost {
    fn set_scheme_handler_factory(&self, factory: Arc<dyn SchemeHandlerFactory>) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.set_scheme_handler_factory(factory)
    }

    fn set_content_handler_factory(&self, factory: Arc<dyn ContentHandlerFactory>) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.set_content_handler_factory(factory)
    }
}

pub fn host_and_context() -> (Arc<InProcessHost>, MuxContext) {
    let host = Arc::new(InProcessHost::with_builtins());
    let context = MuxContext::new(Arc::clone(&host) as Arc<dyn HostRuntime>);
    (host, context)
}
