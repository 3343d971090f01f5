//! Allow-lists deciding which inventory records nbgen manages.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::netbox::RawDevice;

/// Tenant, status and platform allow-lists plus the site network sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Tenant slugs whose records are managed
    pub allowed_tenants: BTreeSet<String>,

    /// Status labels of managed devices
    pub allowed_statuses: BTreeSet<String>,

    /// Platform slugs of managed devices
    pub allowed_platforms: BTreeSet<String>,

    /// Standard IPv4 site prefix length
    pub ipv4_site_prefix: u8,

    /// Standard IPv6 site prefix length
    pub ipv6_site_prefix: u8,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allowed_tenants: set(&["as65342"]),
            allowed_statuses: set(&["Active"]),
            allowed_platforms: set(&["centos", "openbsd"]),
            ipv4_site_prefix: 24,
            ipv6_site_prefix: 64,
        }
    }
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Why a device record was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Tenant,
    Status,
    MissingPlatform,
    Platform,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Tenant => "tenant not allowed",
            Rejection::Status => "status not allowed",
            Rejection::MissingPlatform => "no platform",
            Rejection::Platform => "platform not allowed",
        };
        f.write_str(reason)
    }
}

impl Policy {
    pub fn is_allowed_tenant(&self, tenant: &str) -> bool {
        self.allowed_tenants.contains(tenant)
    }

    pub fn is_allowed_status(&self, status: &str) -> bool {
        self.allowed_statuses.contains(status)
    }

    pub fn is_allowed_platform(&self, platform: &str) -> bool {
        self.allowed_platforms.contains(platform)
    }

    /// Check a device or VM record, in tenant, status, platform order.
    pub fn screen(&self, raw: &RawDevice) -> Result<(), Rejection> {
        if !raw.tenant_slug().is_some_and(|t| self.is_allowed_tenant(t)) {
            return Err(Rejection::Tenant);
        }
        if !raw.status_label().is_some_and(|s| self.is_allowed_status(s)) {
            return Err(Rejection::Status);
        }
        match raw.platform_slug() {
            None => Err(Rejection::MissingPlatform),
            Some(p) if !self.is_allowed_platform(p) => Err(Rejection::Platform),
            Some(_) => Ok(()),
        }
    }

    /// Site-standard prefix length for the family of `net`.
    pub fn site_prefix_for(&self, net: &ipnet::IpNet) -> u8 {
        match net {
            ipnet::IpNet::V4(_) => self.ipv4_site_prefix,
            ipnet::IpNet::V6(_) => self.ipv6_site_prefix,
        }
    }
}
