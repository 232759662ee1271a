//! # Resource Locators
//!
//! Parsed form of `scheme://host[:port]/path[?query]` and `scheme:path`
//! resource locators.

use crate::error::{MuxError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub protocol: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
}

impl Locator {
    pub fn new(protocol: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            host: None,
            port: None,
            path: path.into(),
            query: None,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Extract the protocol of a locator string without parsing the rest
    pub fn protocol_of(spec: &str) -> Result<&str> {
        let (protocol, _) = spec
            .split_once(':')
            .ok_or_else(|| MuxError::InvalidLocator(format!("missing protocol in '{spec}'")))?;
        if !is_valid_scheme(protocol) {
            return Err(MuxError::InvalidLocator(format!(
                "invalid protocol '{protocol}' in '{spec}'"
            )));
        }
        Ok(protocol)
    }

    /// Parse a locator string; the protocol is lowercased
    pub fn parse(spec: &str) -> Result<Self> {
        let protocol = Self::protocol_of(spec)?;
        let rest = &spec[protocol.len() + 1..];

        let (rest, query) = match rest.split_once('?') {
            Some((before, query)) => (before, Some(query.to_string())),
            None => (rest, None),
        };

        let Some(authority_and_path) = rest.strip_prefix("//") else {
            return Ok(Self {
                protocol: protocol.to_ascii_lowercase(),
                host: None,
                port: None,
                path: rest.to_string(),
                query,
            });
        };

        let (authority, path) = match authority_and_path.find('/') {
            Some(idx) => authority_and_path.split_at(idx),
            None => (authority_and_path, ""),
        };

        // A bracketed IPv6 literal with no port ends in ']'
        let port_split = if authority.ends_with(']') {
            None
        } else {
            authority.rsplit_once(':')
        };

        let (host, port) = match port_split {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|e| {
                    MuxError::InvalidLocator(format!("invalid port '{port}' in '{spec}': {e}"))
                })?;
                (host, Some(port))
            }
            None => (authority, None),
        };

        Ok(Self {
            protocol: protocol.to_ascii_lowercase(),
            host: (!host.is_empty()).then(|| host.to_string()),
            port,
            path: path.to_string(),
            query,
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.protocol)?;
        if self.host.is_some() || self.port.is_some() {
            write!(f, "//{}", self.host.as_deref().unwrap_or(""))?;
            if let Some(port) = self.port {
                write!(f, ":{port}")?;
            }
        }
        write!(f, "{}", self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// RFC 3986 scheme syntax: a letter followed by letters, digits, `+`, `-` or `.`
pub fn is_valid_scheme(protocol: &str) -> bool {
    let mut chars = protocol.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}
