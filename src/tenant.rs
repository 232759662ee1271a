//! # Tenants
//!
//! A tenant is an independently lifecycled logical container sharing the
//! process with others. The multiplexer only needs three things from one:
//! whether a code unit belongs to it, and lookups for its current scheme
//! handlers and content decoders. Either lookup may answer `None` when
//! nothing is published yet.

use crate::handlers::{ContentDecoder, SchemeHandler};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse the hyphenated uuid form used in inter-tenant locators
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a unit of loaded code, as seen in one call-chain frame
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CodeUnitId(String);

impl CodeUnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodeUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CodeUnitId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CodeUnitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// What every tenant exposes to the registry
pub trait Tenant: Send + Sync + fmt::Debug {
    fn tenant_id(&self) -> TenantId;

    fn owns_code_unit(&self, unit: &CodeUnitId) -> bool;

    fn lookup_scheme_handler(&self, protocol: &str) -> Option<Arc<dyn SchemeHandler>>;

    fn lookup_content_decoder(&self, mime_type: &str) -> Option<Arc<dyn ContentDecoder>>;
}

/// A tenant backed by in-memory service tables.
///
/// Handlers and decoders can be published and withdrawn at any time; the
/// set of owned code units is fixed at construction.
#[derive(Debug)]
pub struct ServiceTenant {
    id: TenantId,
    name: String,
    code_units: HashSet<CodeUnitId>,
    scheme_handlers: DashMap<String, Arc<dyn SchemeHandler>>,
    content_decoders: DashMap<String, Arc<dyn ContentDecoder>>,
}

impl ServiceTenant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TenantId::new(),
            name: name.into(),
            code_units: HashSet::new(),
            scheme_handlers: DashMap::new(),
            content_decoders: DashMap::new(),
        }
    }

    #[must_use]
    pub fn with_code_unit(mut self, unit: impl Into<CodeUnitId>) -> Self {
        self.code_units.insert(unit.into());
        self
    }

    #[must_use]
    pub fn with_code_units<I, U>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<CodeUnitId>,
    {
        self.code_units.extend(units.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publish a scheme handler, replacing any previous one for `protocol`
    pub fn publish_scheme_handler(&self, protocol: &str, handler: Arc<dyn SchemeHandler>) {
        self.scheme_handlers
            .insert(protocol.to_ascii_lowercase(), handler);
    }

    pub fn withdraw_scheme_handler(&self, protocol: &str) -> Option<Arc<dyn SchemeHandler>> {
        self.scheme_handlers
            .remove(&protocol.to_ascii_lowercase())
            .map(|(_, handler)| handler)
    }

    /// Publish a content decoder, replacing any previous one for `mime_type`
    pub fn publish_content_decoder(&self, mime_type: &str, decoder: Arc<dyn ContentDecoder>) {
        self.content_decoders.insert(mime_type.to_string(), decoder);
    }

    pub fn withdraw_content_decoder(&self, mime_type: &str) -> Option<Arc<dyn ContentDecoder>> {
        self.content_decoders
            .remove(mime_type)
            .map(|(_, decoder)| decoder)
    }
}

impl Tenant for ServiceTenant {
    fn tenant_id(&self) -> TenantId {
        self.id
    }

    fn owns_code_unit(&self, unit: &CodeUnitId) -> bool {
        self.code_units.contains(unit)
    }

    fn lookup_scheme_handler(&self, protocol: &str) -> Option<Arc<dyn SchemeHandler>> {
        self.scheme_handlers
            .get(&protocol.to_ascii_lowercase())
            .map(|entry| Arc::clone(entry.value()))
    }

    fn lookup_content_decoder(&self, mime_type: &str) -> Option<Arc<dyn ContentDecoder>> {
        self.content_decoders
            .get(mime_type)
            .map(|entry| Arc::clone(entry.value()))
    }
}
