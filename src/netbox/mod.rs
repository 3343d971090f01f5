//! Read-only client for the NetBox inventory service.
//!
//! The client issues one list request per collection, with a page size
//! large enough to return the whole collection, and keeps the raw payload
//! for the rest of its lifetime. Typed records are decoded from the cached
//! payload on every call.
//!
//! ```rust,ignore
//! use nbgen::config::NetboxConfig;
//! use nbgen::netbox::NetboxClient;
//!
//! let client = NetboxClient::new(&NetboxConfig::default())?;
//! let tenants = client.tenants()?;   // one request
//! let again = client.tenants()?;     // served from the cache
//! ```

pub mod cache;
pub mod records;
pub mod transport;

pub use cache::{CacheStats, Snapshot, SnapshotCache};
pub use records::{
    AddressRef, ChoiceField, NestedRef, Page, RawConfigContext, RawDevice, RawIpAddress,
    RawPrefix, RawTag, RawTenant,
};
pub use transport::{HttpTransport, Transport};

use std::fmt;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::NetboxConfig;
use crate::error::{Error, Result};

/// Default page size; large enough to fetch any collection in one round trip.
pub const DEFAULT_LIMIT: u32 = 9999;

/// The list endpoints nbgen reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Prefixes,
    IpAddresses,
    Devices,
    VirtualMachines,
    ConfigContexts,
    Tenants,
}

impl Collection {
    /// Every collection, in prewarm order.
    pub const ALL: [Collection; 6] = [
        Collection::Prefixes,
        Collection::IpAddresses,
        Collection::Devices,
        Collection::VirtualMachines,
        Collection::ConfigContexts,
        Collection::Tenants,
    ];

    /// Endpoint path relative to the API root.
    pub fn path(self) -> &'static str {
        match self {
            Collection::Prefixes => "ipam/prefixes/",
            Collection::IpAddresses => "ipam/ip-addresses/",
            Collection::Devices => "dcim/devices/",
            Collection::VirtualMachines => "virtualization/virtual-machines/",
            Collection::ConfigContexts => "extras/config-contexts/",
            Collection::Tenants => "tenancy/tenants/",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Prefixes => "prefixes",
            Collection::IpAddresses => "ip addresses",
            Collection::Devices => "devices",
            Collection::VirtualMachines => "virtual machines",
            Collection::ConfigContexts => "config contexts",
            Collection::Tenants => "tenants",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caching NetBox client.
#[derive(Debug)]
pub struct NetboxClient {
    transport: Box<dyn Transport>,
    cache: SnapshotCache,
    limit: u32,
}

impl NetboxClient {
    /// Create a client speaking HTTP(S) to the configured host.
    pub fn new(config: &NetboxConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        info!("Using NetBox API at {}", transport.base_url());
        Ok(Self::with_transport(transport, config.limit))
    }

    /// Create a client over any transport.
    pub fn with_transport(transport: impl Transport + 'static, limit: u32) -> Self {
        Self {
            transport: Box::new(transport),
            cache: SnapshotCache::new(),
            limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Forget every cached payload.
    pub fn reset_cache(&self) {
        self.cache.reset();
    }

    /// Fetch every collection up front, failing on the first error.
    pub fn prewarm(&self) -> Result<()> {
        for collection in Collection::ALL {
            self.snapshot(collection)?;
        }
        Ok(())
    }

    /// Raw payload of a collection, fetched on first use.
    pub fn snapshot(&self, collection: Collection) -> Result<Snapshot> {
        self.cache.get_or_fetch(collection, || {
            let page = self.transport.fetch(collection, self.limit)?;
            if page.is_truncated() {
                warn!(
                    "{} listing truncated at {} of {:?} records; raise the limit",
                    collection,
                    page.results.len(),
                    page.count
                );
            }
            debug!("fetched {} {}", page.results.len(), collection);
            Ok(page.results)
        })
    }

    fn records<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let snapshot = self.snapshot(collection)?;
        snapshot
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                T::deserialize(value).map_err(|e| {
                    Error::retrieval_with_source(
                        collection,
                        format!("Record {} has an unexpected shape", idx),
                        e,
                    )
                })
            })
            .collect()
    }

    pub fn prefixes(&self) -> Result<Vec<RawPrefix>> {
        self.records(Collection::Prefixes)
    }

    pub fn ip_addresses(&self) -> Result<Vec<RawIpAddress>> {
        self.records(Collection::IpAddresses)
    }

    pub fn devices(&self) -> Result<Vec<RawDevice>> {
        self.records(Collection::Devices)
    }

    pub fn virtual_machines(&self) -> Result<Vec<RawDevice>> {
        self.records(Collection::VirtualMachines)
    }

    pub fn config_contexts(&self) -> Result<Vec<RawConfigContext>> {
        self.records(Collection::ConfigContexts)
    }

    pub fn tenants(&self) -> Result<Vec<RawTenant>> {
        self.records(Collection::Tenants)
    }
}
