//! Shared test utilities and fixtures for the nbgen test suite.
//!
//! This module provides:
//! - `FakeTransport`, a scripted transport that counts requests
//! - Fluent builders for raw device and VM records
//! - A sample inventory exercising every filter and derivation
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use nbgen::config::Config;
use nbgen::generate::Generator;
use nbgen::inventory::{Inventory, Policy};
use nbgen::netbox::{Collection, NetboxClient, Page, Transport, DEFAULT_LIMIT};
use nbgen::{Error, Result};

// ============================================================================
// Fake transport
// ============================================================================

/// Transport serving canned pages and recording every request.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    pages: HashMap<Collection, Vec<Value>>,
    failing: Arc<Mutex<HashSet<Collection>>>,
    calls: Arc<Mutex<Vec<(Collection, u32)>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` for `collection`.
    pub fn with(mut self, collection: Collection, records: Vec<Value>) -> Self {
        self.pages.insert(collection, records);
        self
    }

    /// Fail every request for `collection`.
    pub fn failing(self, collection: Collection) -> Self {
        self.set_failing(collection, true);
        self
    }

    /// Toggle failures; clones share this switch and the call log.
    pub fn set_failing(&self, collection: Collection, failing: bool) {
        let mut set = self.failing.lock();
        if failing {
            set.insert(collection);
        } else {
            set.remove(&collection);
        }
    }

    /// Requests issued for `collection` so far.
    pub fn calls(&self, collection: Collection) -> usize {
        self.calls.lock().iter().filter(|(c, _)| *c == collection).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    /// Limits passed with every request, in order.
    pub fn limits(&self) -> Vec<u32> {
        self.calls.lock().iter().map(|(_, limit)| *limit).collect()
    }
}

impl Transport for FakeTransport {
    fn fetch(&self, collection: Collection, limit: u32) -> Result<Page> {
        self.calls.lock().push((collection, limit));
        if self.failing.lock().contains(&collection) {
            return Err(Error::retrieval(collection, "HTTP 503 Service Unavailable"));
        }
        Ok(Page::from_results(
            self.pages.get(&collection).cloned().unwrap_or_default(),
        ))
    }
}

// ============================================================================
// Record builders
// ============================================================================

/// Builder for raw device and virtual machine records.
#[derive(Debug, Clone)]
pub struct DeviceBuilder {
    record: serde_json::Map<String, Value>,
}

impl DeviceBuilder {
    /// An active, as65342, centos device without addresses.
    pub fn new(name: &str) -> Self {
        let mut record = serde_json::Map::new();
        record.insert("name".into(), json!(name));
        record.insert("status".into(), json!({"value": "active", "label": "Active"}));
        record.insert("tenant".into(), json!({"name": "AS65342", "slug": "as65342"}));
        record.insert("platform".into(), json!({"name": "CentOS", "slug": "centos"}));
        Self { record }
    }

    pub fn tenant(mut self, slug: &str) -> Self {
        self.record.insert("tenant".into(), json!({"slug": slug}));
        self
    }

    pub fn no_tenant(mut self) -> Self {
        self.record.insert("tenant".into(), Value::Null);
        self
    }

    pub fn status(mut self, label: &str) -> Self {
        self.record
            .insert("status".into(), json!({"value": label.to_lowercase(), "label": label}));
        self
    }

    pub fn platform(mut self, slug: &str) -> Self {
        self.record.insert("platform".into(), json!({"slug": slug}));
        self
    }

    pub fn no_platform(mut self) -> Self {
        self.record.insert("platform".into(), Value::Null);
        self
    }

    pub fn site(mut self, slug: &str) -> Self {
        self.record.insert("site".into(), json!({"slug": slug}));
        self
    }

    /// Set the IPv4 primary, which also becomes the generic primary.
    pub fn ip4(mut self, cidr: &str) -> Self {
        self.record.insert("primary_ip4".into(), json!({"address": cidr}));
        self.record.insert("primary_ip".into(), json!({"address": cidr}));
        self
    }

    pub fn ip6(mut self, cidr: &str) -> Self {
        self.record.insert("primary_ip6".into(), json!({"address": cidr}));
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.record.insert("tags".into(), json!(tags));
        self
    }

    pub fn config(mut self, data: Value) -> Self {
        self.record.insert("config_context".into(), data);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.record)
    }
}

pub fn prefix(cidr: &str, tenant: Option<&str>) -> Value {
    json!({"prefix": cidr, "tenant": tenant.map(|t| json!({"slug": t}))})
}

pub fn ip_address(cidr: &str, dns_name: &str, tenant: &str) -> Value {
    json!({"address": cidr, "dns_name": dns_name, "tenant": {"slug": tenant}})
}

// ============================================================================
// Sample inventory
// ============================================================================

/// A small site: two managed devices, one managed VM, and records each
/// filter should drop.
pub fn sample_transport() -> FakeTransport {
    FakeTransport::new()
        .with(
            Collection::Devices,
            vec![
                DeviceBuilder::new("web01.as65342.net")
                    .site("ams1")
                    .ip4("10.0.1.10/24")
                    .ip6("2001:db8:0:1::10/64")
                    .tags(&["webserver"])
                    .config(json!({"ntp": ["ntp.as65342.net"]}))
                    .build(),
                DeviceBuilder::new("fw01.as65342.net")
                    .platform("openbsd")
                    .site("ams1")
                    .ip4("10.0.2.5/24")
                    .config(json!({}))
                    .build(),
                // no platform: not managed, still has a gateway
                DeviceBuilder::new("sw01.as65342.net")
                    .no_platform()
                    .site("ams1")
                    .ip4("10.0.3.2/24")
                    .build(),
                DeviceBuilder::new("db01.customer.net").tenant("customer").build(),
                DeviceBuilder::new("new01.as65342.net").status("Planned").build(),
            ],
        )
        .with(
            Collection::VirtualMachines,
            vec![DeviceBuilder::new("vm01.as65342.net")
                .ip4("10.0.1.20/24")
                .ip6("2001:db8:0:1::20/64")
                .tags(&["webserver", "dns"])
                .build()],
        )
        .with(
            Collection::Prefixes,
            vec![
                prefix("10.0.1.0/24", Some("as65342")),
                prefix("10.0.0.0/16", Some("as65342")),
                prefix("2001:db8:0:1::/64", Some("as65342")),
                prefix("2001:db8::/48", Some("as65342")),
                prefix("10.9.0.0/24", Some("customer")),
                prefix("10.8.0.0/24", None),
            ],
        )
        .with(
            Collection::IpAddresses,
            vec![
                ip_address("10.0.1.10/24", "web01.as65342.net", "as65342"),
                ip_address("2001:db8:0:1::10/64", "web01.as65342.net", "as65342"),
                ip_address("10.0.2.5/24", "fw01.as65342.net", "as65342"),
                ip_address("10.0.1.99/24", "", "as65342"),
                ip_address("192.168.0.10/24", "x.as65342.net", "customer"),
            ],
        )
        .with(
            Collection::ConfigContexts,
            vec![
                json!({
                    "name": "centos",
                    "weight": 1000,
                    "platforms": [{"slug": "centos"}],
                    "data": {"selinux": "enforcing"},
                }),
                json!({
                    "name": "dns_zones",
                    "data": {"dns_zones": [{
                        "name": "as65342.net",
                        "records": [{"name": "www", "type": "CNAME", "value": "web01"}],
                    }]},
                }),
            ],
        )
        .with(
            Collection::Tenants,
            vec![
                json!({"name": "AS65342", "slug": "as65342"}),
                json!({"name": "Customer", "slug": "customer"}),
            ],
        )
}

pub fn client(transport: FakeTransport) -> NetboxClient {
    NetboxClient::with_transport(transport, DEFAULT_LIMIT)
}

pub fn inventory(transport: FakeTransport) -> Inventory {
    Inventory::new(client(transport), Policy::default())
}

pub fn generator(transport: FakeTransport, out: &Path) -> Generator {
    Generator::new(inventory(transport), Config::default(), out)
        .unwrap()
        .with_username("tester")
}
