//! Normalized domain model consumed by the generators.

use std::collections::BTreeSet;
use std::net::IpAddr;

use ipnet::IpNet;
use serde::Serialize;

use super::value::ConfigValue;

/// Whether a managed device came from DCIM or from virtualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Physical,
    Virtual,
}

/// A primary address together with its network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryAddress {
    pub address: IpAddr,
    pub network: IpNet,
    /// Naming-safe network token, see [`printable_network`](super::network::printable_network)
    pub printable_network: String,
}

/// A physical or virtual host under management.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagedDevice {
    pub name: String,
    pub kind: DeviceKind,
    pub primary: Option<PrimaryAddress>,
    pub primary4: Option<PrimaryAddress>,
    pub primary6: Option<PrimaryAddress>,
    pub platform: String,
    /// Site slug, empty when the record has none
    pub site: String,
    pub tenant: String,
    pub tags: BTreeSet<String>,
    pub config: ConfigValue,
}

impl ManagedDevice {
    pub fn primary_ip(&self) -> Option<IpAddr> {
        self.primary.as_ref().map(|p| p.address)
    }

    pub fn primary_ip4(&self) -> Option<IpAddr> {
        self.primary4.as_ref().map(|p| p.address)
    }

    pub fn primary_ip6(&self) -> Option<IpAddr> {
        self.primary6.as_ref().map(|p| p.address)
    }

    /// Hostname up to the first dot.
    pub fn short_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }
}

/// An allocated address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpAddress {
    pub address: IpAddr,
    pub network: IpNet,
    /// DNS name, empty when unset
    pub dns_name: String,
    pub tenant: String,
}

/// First usable address of a managed network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gateway {
    pub address: IpAddr,
    pub network: IpNet,
    pub tenant: String,
    pub printable_address: String,
    pub printable_network: String,
}

impl Gateway {
    pub fn is_ipv6(&self) -> bool {
        self.address.is_ipv6()
    }
}

/// Tenant projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub name: String,
    pub slug: String,
}

/// What a config context is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "slug", rename_all = "lowercase")]
pub enum ContextScope {
    Platform(String),
    Tenant(String),
    Site(String),
    Tag(String),
}

/// Named bundle of structured configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigContext {
    pub name: String,
    pub weight: i64,
    pub scopes: Vec<ContextScope>,
    pub data: ConfigValue,
}

impl ConfigContext {
    /// Contexts without scopes apply to every host.
    pub fn is_global(&self) -> bool {
        self.scopes.is_empty()
    }
}
