//! Inventory normalization for nbgen
//!
//! This module turns raw NetBox records into the domain model every
//! generator consumes:
//!
//! - **Devices**: physical devices and virtual machines merged into one
//!   [`ManagedDevice`] list, filtered by the [`Policy`] allow-lists
//! - **Gateways**: the first host of each site-sized primary network,
//!   deduplicated by address
//! - **Prefixes**: allowed-tenant prefixes of exactly the site size
//! - **IP addresses**, **config contexts** and **tenants**: projections
//!
//! Every listing is rebuilt from the client's cached payload on each call.
//! A malformed address anywhere in a listing aborts that listing.
//!
//! # Example
//!
//! ```rust,ignore
//! use nbgen::inventory::{Inventory, Policy};
//! use nbgen::netbox::NetboxClient;
//!
//! let inventory = Inventory::new(NetboxClient::new(&config.netbox)?, Policy::default());
//! for device in inventory.devices()? {
//!     println!("{} ({})", device.name, device.platform);
//! }
//! ```

pub mod model;
pub mod network;
pub mod policy;
pub mod value;

pub use model::{
    ConfigContext, ContextScope, DeviceKind, Gateway, IpAddress, ManagedDevice, PrimaryAddress,
    Tenant,
};
pub use policy::{Policy, Rejection};
pub use value::{ConfigMap, ConfigValue};

use std::net::IpAddr;

use indexmap::IndexMap;
use ipnet::IpNet;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::netbox::{
    AddressRef, Collection, NetboxClient, RawConfigContext, RawDevice, RawIpAddress, RawPrefix,
    RawTag, RawTenant,
};

/// Weight NetBox assigns to config contexts by default.
const DEFAULT_CONTEXT_WEIGHT: i64 = 1000;

/// Address family a field must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Any,
    V4,
    V6,
}

impl Family {
    fn admits(self, addr: &IpAddr) -> bool {
        match self {
            Family::Any => true,
            Family::V4 => addr.is_ipv4(),
            Family::V6 => addr.is_ipv6(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Family::Any => "IP",
            Family::V4 => "IPv4",
            Family::V6 => "IPv6",
        }
    }
}

/// Normalizing view over a [`NetboxClient`].
#[derive(Debug)]
pub struct Inventory {
    client: NetboxClient,
    policy: Policy,
}

impl Inventory {
    pub fn new(client: NetboxClient, policy: Policy) -> Self {
        Self { client, policy }
    }

    pub fn client(&self) -> &NetboxClient {
        &self.client
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Managed devices: physical devices first, then virtual machines.
    pub fn devices(&self) -> Result<Vec<ManagedDevice>> {
        let devices = self.client.devices()?;
        let vms = self.client.virtual_machines()?;
        normalize_devices(&self.policy, &devices, &vms)
    }

    /// Gateways of every device and VM primary network.
    pub fn gateways(&self) -> Result<Vec<Gateway>> {
        let devices = self.client.devices()?;
        let vms = self.client.virtual_machines()?;
        derive_gateways(&self.policy, &devices, &vms)
    }

    /// Allowed-tenant prefixes of exactly the site size.
    pub fn prefixes(&self) -> Result<Vec<IpNet>> {
        normalize_prefixes(&self.policy, &self.client.prefixes()?)
    }

    /// Allowed-tenant address allocations.
    pub fn ip_addresses(&self) -> Result<Vec<IpAddress>> {
        normalize_ip_addresses(&self.policy, &self.client.ip_addresses()?)
    }

    pub fn config_contexts(&self) -> Result<Vec<ConfigContext>> {
        Ok(self
            .client
            .config_contexts()?
            .into_iter()
            .map(config_context)
            .collect())
    }

    pub fn tenants(&self) -> Result<Vec<Tenant>> {
        Ok(self.client.tenants()?.into_iter().map(tenant).collect())
    }
}

// ============================================================================
// Devices
// ============================================================================

/// Filter and normalize raw device and VM records.
pub fn normalize_devices(
    policy: &Policy,
    devices: &[RawDevice],
    vms: &[RawDevice],
) -> Result<Vec<ManagedDevice>> {
    let sources = [
        (Collection::Devices, DeviceKind::Physical, devices),
        (Collection::VirtualMachines, DeviceKind::Virtual, vms),
    ];

    let mut managed = Vec::new();
    for (collection, kind, records) in sources {
        for raw in records {
            if let Err(rejection) = policy.screen(raw) {
                trace!("skipping {} record '{}': {}", collection, raw.label(), rejection);
                continue;
            }
            managed.push(normalize_device(policy, collection, kind, raw)?);
        }
    }

    debug!("normalized {} managed devices", managed.len());
    Ok(managed)
}

fn normalize_device(
    policy: &Policy,
    collection: Collection,
    kind: DeviceKind,
    raw: &RawDevice,
) -> Result<ManagedDevice> {
    let label = raw.label();
    let name = raw.name.clone().ok_or_else(|| Error::MissingField {
        collection,
        record: label.clone(),
        field: "name",
    })?;

    let primary = |field: &Option<AddressRef>, family| {
        field
            .as_ref()
            .map(|r| primary_address(policy, collection, &label, &r.address, family))
            .transpose()
    };

    Ok(ManagedDevice {
        primary: primary(&raw.primary_ip, Family::Any)?,
        primary4: primary(&raw.primary_ip4, Family::V4)?,
        primary6: primary(&raw.primary_ip6, Family::V6)?,
        name,
        kind,
        // screen() guarantees both are present
        platform: raw.platform_slug().unwrap_or_default().to_string(),
        tenant: raw.tenant_slug().unwrap_or_default().to_string(),
        site: raw.site_slug().unwrap_or_default().to_string(),
        tags: raw.tags.iter().filter_map(RawTag::key).map(String::from).collect(),
        config: raw.config_context.clone().map(ConfigValue::from).unwrap_or_default(),
    })
}

fn primary_address(
    policy: &Policy,
    collection: Collection,
    record: &str,
    value: &str,
    family: Family,
) -> Result<PrimaryAddress> {
    let (address, network) = parse_address(collection, record, value, family)?;
    Ok(PrimaryAddress {
        address,
        printable_network: network::printable_network(&network, policy.site_prefix_for(&network)),
        network,
    })
}

fn parse_address(
    collection: Collection,
    record: &str,
    value: &str,
    family: Family,
) -> Result<(IpAddr, IpNet)> {
    let (address, net) = network::parse_cidr(value)
        .map_err(|e| Error::invalid_address(collection, record, value, e.to_string()))?;

    if !family.admits(&address) {
        return Err(Error::invalid_address(
            collection,
            record,
            value,
            format!("expected an {} address", family.name()),
        ));
    }

    Ok((address, net))
}

// ============================================================================
// Gateways
// ============================================================================

/// Derive one gateway per distinct first-host address.
///
/// Every device and VM with a tenant contributes, regardless of the device
/// allow-lists, so dependencies exist for all networks that are monitored.
pub fn derive_gateways(
    policy: &Policy,
    devices: &[RawDevice],
    vms: &[RawDevice],
) -> Result<Vec<Gateway>> {
    let records = devices
        .iter()
        .map(|raw| (Collection::Devices, raw))
        .chain(vms.iter().map(|raw| (Collection::VirtualMachines, raw)));

    let mut gateways: IndexMap<IpAddr, Gateway> = IndexMap::new();

    for (collection, raw) in records {
        let Some(tenant) = raw.tenant_slug() else {
            continue;
        };
        let label = raw.label();

        let candidates = [
            (&raw.primary_ip4, Family::V4, policy.ipv4_site_prefix),
            (&raw.primary_ip6, Family::V6, policy.ipv6_site_prefix),
        ];

        for (field, family, max_len) in candidates {
            let Some(field) = field else {
                continue;
            };
            let (_, net) = parse_address(collection, &label, &field.address, family)?;
            if net.prefix_len() > max_len {
                continue;
            }

            let address = network::first_host(&net);
            gateways.entry(address).or_insert_with(|| Gateway {
                address,
                network: net,
                tenant: tenant.to_string(),
                printable_address: network::printable_address(&address),
                printable_network: network::printable_network(&net, max_len),
            });
        }
    }

    debug!("derived {} gateways", gateways.len());
    Ok(gateways.into_values().collect())
}

// ============================================================================
// Prefixes and addresses
// ============================================================================

/// Keep allowed-tenant prefixes whose length is exactly the site size.
pub fn normalize_prefixes(policy: &Policy, prefixes: &[RawPrefix]) -> Result<Vec<IpNet>> {
    let mut managed = Vec::new();

    for raw in prefixes {
        if !raw.tenant_slug().is_some_and(|t| policy.is_allowed_tenant(t)) {
            continue;
        }

        let net: IpNet = raw.prefix.trim().parse().map_err(|e: ipnet::AddrParseError| {
            let record = raw.id.map_or_else(|| raw.prefix.clone(), |id| format!("#{}", id));
            Error::invalid_address(Collection::Prefixes, record, &raw.prefix, e.to_string())
        })?;

        if net.prefix_len() == policy.site_prefix_for(&net) {
            managed.push(net.trunc());
        }
    }

    Ok(managed)
}

/// Keep allowed-tenant addresses, split into address and network.
pub fn normalize_ip_addresses(policy: &Policy, addresses: &[RawIpAddress]) -> Result<Vec<IpAddress>> {
    let mut managed = Vec::new();

    for raw in addresses {
        let Some(tenant) = raw.tenant_slug().filter(|t| policy.is_allowed_tenant(t)) else {
            continue;
        };

        let record = raw.id.map_or_else(|| raw.address.clone(), |id| format!("#{}", id));
        let (address, network) =
            parse_address(Collection::IpAddresses, &record, &raw.address, Family::Any)?;

        managed.push(IpAddress {
            address,
            network,
            dns_name: raw.dns_name.clone().unwrap_or_default(),
            tenant: tenant.to_string(),
        });
    }

    Ok(managed)
}

// ============================================================================
// Projections
// ============================================================================

fn config_context(raw: RawConfigContext) -> ConfigContext {
    let slugs = |refs: &[crate::netbox::NestedRef]| -> Vec<String> {
        refs.iter().filter_map(|r| r.key()).map(String::from).collect()
    };

    let mut scopes = Vec::new();
    scopes.extend(slugs(&raw.platforms).into_iter().map(ContextScope::Platform));
    scopes.extend(slugs(&raw.tenants).into_iter().map(ContextScope::Tenant));
    scopes.extend(slugs(&raw.sites).into_iter().map(ContextScope::Site));
    scopes.extend(
        raw.tags
            .iter()
            .filter_map(RawTag::key)
            .map(|t| ContextScope::Tag(t.to_string())),
    );

    ConfigContext {
        name: raw.name,
        weight: raw.weight.unwrap_or(DEFAULT_CONTEXT_WEIGHT),
        scopes,
        data: ConfigValue::from(raw.data),
    }
}

fn tenant(raw: RawTenant) -> Tenant {
    Tenant {
        name: raw.name,
        slug: raw.slug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    fn active(name: &str, platform: &str, ip4: &str, ip6: &str) -> RawDevice {
        raw(json!({
            "name": name,
            "status": {"value": "active", "label": "Active"},
            "tenant": {"slug": "as65342"},
            "platform": {"slug": platform},
            "site": {"slug": "ams1"},
            "primary_ip": {"address": ip4},
            "primary_ip4": {"address": ip4},
            "primary_ip6": {"address": ip6},
            "tags": ["webserver"],
            "config_context": {"ntp": "ntp.as65342.net"},
        }))
    }

    #[test]
    fn test_device_fields() {
        let devices = [active("web01.as65342.net", "centos", "10.0.1.10/24", "2001:db8::10/64")];
        let managed = normalize_devices(&Policy::default(), &devices, &[]).unwrap();

        assert_eq!(managed.len(), 1);
        let d = &managed[0];
        assert_eq!(d.kind, DeviceKind::Physical);
        assert_eq!(d.site, "ams1");
        assert_eq!(d.short_name(), "web01");
        assert_eq!(d.primary_ip4().unwrap().to_string(), "10.0.1.10");
        assert_eq!(d.primary4.as_ref().unwrap().printable_network, "10-0-1-0");
        assert_eq!(d.primary6.as_ref().unwrap().printable_network, "2001-db8");
        assert_eq!(d.config.get("ntp").and_then(ConfigValue::as_str), Some("ntp.as65342.net"));
        assert!(d.tags.contains("webserver"));
    }

    #[test]
    fn test_vms_follow_devices() {
        let devices = [active("hv01", "centos", "10.0.1.2/24", "2001:db8::2/64")];
        let vms = [active("vm01", "openbsd", "10.0.1.3/24", "2001:db8::3/64")];
        let managed = normalize_devices(&Policy::default(), &devices, &vms).unwrap();

        let names: Vec<_> = managed.iter().map(|d| (d.name.as_str(), d.kind)).collect();
        assert_eq!(
            names,
            vec![("hv01", DeviceKind::Physical), ("vm01", DeviceKind::Virtual)]
        );
    }

    #[test]
    fn test_absent_address_fields_stay_empty() {
        let device: RawDevice = raw(json!({
            "name": "oob01",
            "status": {"label": "Active"},
            "tenant": {"slug": "as65342"},
            "platform": {"slug": "openbsd"},
            "primary_ip4": {"address": "10.0.9.5/24"},
        }));
        let managed = normalize_devices(&Policy::default(), &[device], &[]).unwrap();
        assert!(managed[0].primary.is_none());
        assert!(managed[0].primary6.is_none());
        assert!(managed[0].site.is_empty());
    }

    #[test]
    fn test_wrong_family_is_fatal() {
        let device = active("web01", "centos", "10.0.1.10/24", "10.0.1.10/24");
        let err = normalize_devices(&Policy::default(), &[device], &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { .. }));
    }

    #[test]
    fn test_unnamed_managed_device_is_fatal() {
        let device: RawDevice = raw(json!({
            "id": 12,
            "status": {"label": "Active"},
            "tenant": {"slug": "as65342"},
            "platform": {"slug": "centos"},
        }));
        let err = normalize_devices(&Policy::default(), &[device], &[]).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "name", .. }));
    }

    #[test]
    fn test_gateway_skips_large_prefix_lengths() {
        let devices = [active("web01", "centos", "10.0.1.10/25", "2001:db8::10/80")];
        let gateways = derive_gateways(&Policy::default(), &devices, &[]).unwrap();
        assert!(gateways.is_empty());
    }

    #[test]
    fn test_gateway_fields() {
        let devices = [active("web01", "centos", "10.0.1.10/24", "2001:db8::10/64")];
        let gateways = derive_gateways(&Policy::default(), &devices, &[]).unwrap();

        assert_eq!(gateways.len(), 2);
        assert_eq!(gateways[0].address.to_string(), "10.0.1.1");
        assert_eq!(gateways[0].printable_address, "10-0-1-1");
        assert_eq!(gateways[0].printable_network, "10-0-1-0");
        assert_eq!(gateways[0].tenant, "as65342");
        assert!(gateways[1].is_ipv6());
        assert_eq!(gateways[1].address.to_string(), "2001:db8::1");
    }

    #[test]
    fn test_config_context_scopes() {
        let ctx: RawConfigContext = raw(json!({
            "name": "centos-base",
            "platforms": [{"slug": "centos"}],
            "tags": ["webserver"],
            "data": {"selinux": "enforcing"},
        }));
        let ctx = config_context(ctx);
        assert_eq!(ctx.weight, 1000);
        assert_eq!(
            ctx.scopes,
            vec![
                ContextScope::Platform("centos".into()),
                ContextScope::Tag("webserver".into())
            ]
        );
        assert!(!ctx.is_global());
    }
}
