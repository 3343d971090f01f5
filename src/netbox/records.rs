//! Raw record shapes returned by the NetBox list endpoints.
//!
//! Only the fields nbgen consumes are modelled. Everything is optional
//! unless NetBox always returns it, so that partially populated records
//! decode and the normalizer decides what to do with the gaps.

use serde::Deserialize;

/// One page of a list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    /// Total number of objects in the collection
    #[serde(default)]
    pub count: Option<u64>,
    /// URL of the next page, if the collection exceeded the limit
    #[serde(default)]
    pub next: Option<String>,
    /// Raw records of this page
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl Page {
    /// Build a complete single page from raw records.
    pub fn from_results(results: Vec<serde_json::Value>) -> Self {
        Self {
            count: Some(results.len() as u64),
            next: None,
            results,
        }
    }

    /// Whether the server has more records than this page holds.
    pub fn is_truncated(&self) -> bool {
        self.next.is_some()
    }
}

/// Nested reference to another object (tenant, site, platform, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NestedRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl NestedRef {
    /// The slug, falling back to the display name.
    pub fn key(&self) -> Option<&str> {
        self.slug.as_deref().or(self.name.as_deref())
    }
}

/// Choice field as rendered by the API: `{"value": "active", "label": "Active"}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceField {
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Nested IP address reference used by `primary_ip*` fields.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressRef {
    #[serde(default)]
    pub id: Option<u64>,
    /// CIDR notation, e.g. `10.0.1.5/24`
    pub address: String,
}

/// A tag, either a bare string (NetBox 2.x) or a nested tag object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTag {
    Name(String),
    Object(NestedRef),
}

impl RawTag {
    /// The tag's slug, or its name when no slug is present.
    pub fn key(&self) -> Option<&str> {
        match self {
            RawTag::Name(name) => Some(name.as_str()),
            RawTag::Object(tag) => tag.key(),
        }
    }
}

/// A physical device or a virtual machine; both share the fields we read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDevice {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<ChoiceField>,
    #[serde(default)]
    pub tenant: Option<NestedRef>,
    #[serde(default)]
    pub platform: Option<NestedRef>,
    #[serde(default)]
    pub site: Option<NestedRef>,
    #[serde(default)]
    pub primary_ip: Option<AddressRef>,
    #[serde(default)]
    pub primary_ip4: Option<AddressRef>,
    #[serde(default)]
    pub primary_ip6: Option<AddressRef>,
    #[serde(default)]
    pub tags: Vec<RawTag>,
    #[serde(default)]
    pub config_context: Option<serde_json::Value>,
}

impl RawDevice {
    /// Name for diagnostics: the record name, or `#<id>` for unnamed records.
    pub fn label(&self) -> String {
        match (&self.name, self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("#{}", id),
            (None, None) => "<unnamed>".to_string(),
        }
    }

    pub fn tenant_slug(&self) -> Option<&str> {
        self.tenant.as_ref().and_then(NestedRef::key)
    }

    pub fn status_label(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.label.as_deref())
    }

    pub fn platform_slug(&self) -> Option<&str> {
        self.platform.as_ref().and_then(NestedRef::key)
    }

    pub fn site_slug(&self) -> Option<&str> {
        self.site.as_ref().and_then(NestedRef::key)
    }
}

/// An IPAM prefix.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPrefix {
    #[serde(default)]
    pub id: Option<u64>,
    pub prefix: String,
    #[serde(default)]
    pub tenant: Option<NestedRef>,
}

impl RawPrefix {
    pub fn tenant_slug(&self) -> Option<&str> {
        self.tenant.as_ref().and_then(NestedRef::key)
    }
}

/// An IPAM address allocation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIpAddress {
    #[serde(default)]
    pub id: Option<u64>,
    pub address: String,
    #[serde(default)]
    pub dns_name: Option<String>,
    #[serde(default)]
    pub tenant: Option<NestedRef>,
}

impl RawIpAddress {
    pub fn tenant_slug(&self) -> Option<&str> {
        self.tenant.as_ref().and_then(NestedRef::key)
    }
}

/// A config context with its assignment scopes.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigContext {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub platforms: Vec<NestedRef>,
    #[serde(default)]
    pub tenants: Vec<NestedRef>,
    #[serde(default)]
    pub sites: Vec<NestedRef>,
    #[serde(default)]
    pub tags: Vec<RawTag>,
}

/// A tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTenant {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub slug: String,
}
