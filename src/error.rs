//! # Error Handling
//!
//! One error enum for the crate. Resolution failures carry a structured
//! target and reason so callers can tell "nothing there yet" apart from a
//! broken system.

use crate::tenant::TenantId;
use std::fmt;
use thiserror::Error;

/// What a resolution attempt was looking for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolutionTarget {
    /// A scheme handler for the given protocol
    Scheme(String),
    /// A content decoder for the given mime type
    Content(String),
}

impl fmt::Display for ResolutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionTarget::Scheme(protocol) => write!(f, "protocol '{protocol}'"),
            ResolutionTarget::Content(mime_type) => write!(f, "mime type '{mime_type}'"),
        }
    }
}

/// Why a resolution attempt produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnavailableReason {
    /// No tenant is currently active
    NoActiveTenant,
    /// Tenants are active but none owns the calling code
    NoOwningTenant,
    /// The owning tenant has no handler for the target right now
    NoHandler(TenantId),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::NoActiveTenant => write!(f, "no active tenant"),
            UnavailableReason::NoOwningTenant => write!(f, "no owning tenant in caller context"),
            UnavailableReason::NoHandler(id) => write!(f, "tenant {id} has no handler"),
        }
    }
}

/// The two host-runtime hook slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostHook {
    /// Slot for the scheme handler factory
    SchemeFactory,
    /// Slot for the content handler factory
    ContentFactory,
}

impl fmt::Display for HostHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostHook::SchemeFactory => write!(f, "scheme handler factory"),
            HostHook::ContentFactory => write!(f, "content handler factory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MuxError {
    /// No tenant handler for the target at the moment of use; may succeed later
    #[error("Resolution unavailable for {target}: {reason}")]
    ResolutionUnavailable {
        target: ResolutionTarget,
        reason: UnavailableReason,
    },
    /// The host refused a second assignment of a hook slot
    #[error("Host hook already set: {0}")]
    HookAlreadySet(HostHook),
    /// The one installation attempt failed; it is never retried
    #[error("Hook installation failed: {0}")]
    HookInstallationFailed(String),
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),
    /// Neither the installed factory nor a built-in handles the protocol
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),
    /// No decoder for the connection's content type
    #[error("Unknown content type: {0}")]
    UnknownContentType(String),
    /// Failure inside a concrete handler or decoder, including I/O
    #[error("Handler error: {0}")]
    HandlerError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl MuxError {
    pub fn scheme_unavailable(protocol: impl Into<String>, reason: UnavailableReason) -> Self {
        MuxError::ResolutionUnavailable {
            target: ResolutionTarget::Scheme(protocol.into()),
            reason,
        }
    }

    pub fn content_unavailable(mime_type: impl Into<String>, reason: UnavailableReason) -> Self {
        MuxError::ResolutionUnavailable {
            target: ResolutionTarget::Content(mime_type.into()),
            reason,
        }
    }

    /// True for "nothing there yet" failures, which a later attempt may satisfy
    pub fn is_resolution_unavailable(&self) -> bool {
        matches!(self, MuxError::ResolutionUnavailable { .. })
    }

    pub fn unavailable_reason(&self) -> Option<UnavailableReason> {
        match self {
            MuxError::ResolutionUnavailable { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for MuxError {
    fn from(error: config::ConfigError) -> Self {
        MuxError::ConfigurationError(error.to_string())
    }
}

impl From<serde_json::Error> for MuxError {
    fn from(error: serde_json::Error) -> Self {
        MuxError::HandlerError(format!("JSON decoding error: {error}"))
    }
}

impl From<std::io::Error> for MuxError {
    fn from(error: std::io::Error) -> Self {
        MuxError::HandlerError(format!("I/O error: {error}"))
    }
}

pub type Result<T> = std::result::Result<T, MuxError>;
