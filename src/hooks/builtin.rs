//! Built-in host handlers used when no factory supplies one.

use crate::constants::mime;
use crate::error::{MuxError, Result};
use crate::handlers::{BufferedConnection, ContentDecoder, Locator, ResourceConnection, SchemeHandler};
use std::path::Path;

/// Reads `file:` locators from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileHandler;

impl LocalFileHandler {
    fn content_type_for(path: &Path) -> &'static str {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => mime::APPLICATION_JSON,
            Some("txt" | "text" | "log" | "md") => mime::TEXT_PLAIN,
            _ => mime::OCTET_STREAM,
        }
    }
}

impl SchemeHandler for LocalFileHandler {
    fn open_connection(&self, locator: &Locator) -> Result<Box<dyn ResourceConnection>> {
        let path = Path::new(&locator.path);
        let body = std::fs::read(path)
            .map_err(|e| MuxError::HandlerError(format!("failed to read {}: {e}", path.display())))?;
        Ok(Box::new(BufferedConnection::new(
            locator.clone(),
            Some(Self::content_type_for(path).to_string()),
            body,
        )))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextDecoder;

impl ContentDecoder for PlainTextDecoder {
    fn decode(&self, connection: &mut dyn ResourceConnection) -> Result<serde_json::Value> {
        let bytes = connection.read_to_end()?;
        let text = String::from_utf8(bytes)
            .map_err(|e| MuxError::HandlerError(format!("content is not UTF-8: {e}")))?;
        Ok(serde_json::Value::String(text))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl ContentDecoder for JsonDecoder {
    fn decode(&self, connection: &mut dyn ResourceConnection) -> Result<serde_json::Value> {
        let bytes = connection.read_to_end()?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
