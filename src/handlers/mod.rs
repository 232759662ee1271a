//! # Handler Contracts
//!
//! The shapes the host runtime talks to: scheme handlers that open
//! connections for a protocol, and content decoders that turn a connection's
//! bytes into a structured value.
//!
//! Every operation returns [`Result`] so that a resolution proxy standing in
//! for a handler can report resolution-unavailable from any of them.

pub mod locator;

pub use locator::{is_valid_scheme, Locator};

use crate::error::Result;
use std::fmt::Debug;

/// An open connection to a located resource
pub trait ResourceConnection: Send + Debug {
    fn locator(&self) -> &Locator;

    /// Mime type of the resource, if known
    fn content_type(&self) -> Option<&str>;

    fn read_to_end(&mut self) -> Result<Vec<u8>>;
}

/// Handler for one protocol
pub trait SchemeHandler: Send + Sync + Debug {
    fn open_connection(&self, locator: &Locator) -> Result<Box<dyn ResourceConnection>>;

    fn parse_locator(&self, spec: &str) -> Result<Locator> {
        Locator::parse(spec)
    }

    fn to_external_form(&self, locator: &Locator) -> Result<String> {
        Ok(locator.to_string())
    }

    fn default_port(&self) -> Result<Option<u16>> {
        Ok(None)
    }
}

/// Decoder for one mime type
pub trait ContentDecoder: Send + Sync + Debug {
    fn decode(&self, connection: &mut dyn ResourceConnection) -> Result<serde_json::Value>;
}

/// A connection over an in-memory byte buffer
#[derive(Debug, Clone)]
pub struct BufferedConnection {
    locator: Locator,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl BufferedConnection {
    pub fn new(locator: Locator, content_type: Option<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            locator,
            content_type,
            body: body.into(),
        }
    }
}

impl ResourceConnection for BufferedConnection {
    fn locator(&self) -> &Locator {
        &self.locator
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn read_to_end(&mut self) -> Result<Vec<u8>> {
        Ok(std::mem::take(&mut self.body))
    }
}
