//! Forward DNS zone files.
//!
//! Zones and their static records are defined in a config context (named
//! `dns_zones` by default) whose data looks like:
//!
//! ```json
//! {"dns_zones": [{"name": "as65342.net", "records": [
//!     {"name": "@", "type": "TXT", "value": "\"v=spf1 mx -all\""}
//! ]}]}
//! ```
//!
//! Every allowed-tenant address whose DNS name falls inside a zone adds an
//! `A` or `AAAA` record to it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{file_stem, writer, Generator};
use crate::config::DnsConfig;
use crate::error::{Error, Result};
use crate::inventory::{ConfigContext, IpAddress};

pub(crate) const ZONE_TEMPLATE_NAME: &str = "dns/zone";

pub(crate) const ZONE_TEMPLATE: &str = r#"$ORIGIN .
$TTL {{ dns.ttl }}
{{ zone }}   IN SOA  {{ dns.master }} {{ dns.hostmaster }} (
                                {{ serial }} ; serial
                                3600       ; refresh (1 hour)
                                7200       ; retry (2 hours)
                                2419200    ; expire (4 weeks)
                                {{ dns.ttl }}         ; minimum
                                )
                        NS      {{ dns.nameserver }}
                        MX      {{ dns.mx_priority }} {{ dns.mail_exchanger }}
$ORIGIN {{ zone }}.
{% for record in records %}
{{ record.name }} {{ record.type }} {{ record.value }}
{% endfor %}
"#;

/// One resource record line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// A forward zone and its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    #[serde(default)]
    pub records: Vec<ZoneRecord>,
}

#[derive(Debug, Serialize)]
struct ZoneView<'a> {
    zone: &'a str,
    serial: u32,
    dns: &'a DnsConfig,
    records: &'a [ZoneRecord],
}

/// Zone serial for a run started now: Unix time in seconds.
pub fn serial_now() -> u32 {
    u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX)
}

/// Zone definitions from the context called `context_name`.
///
/// The zone list sits under the key of the same name inside the context
/// data. No such context yields no zones.
pub fn zones_from_contexts(contexts: &[ConfigContext], context_name: &str) -> Result<Vec<Zone>> {
    let Some(ctx) = contexts.iter().find(|c| c.name == context_name) else {
        warn!("no config context named '{}', no zones to generate", context_name);
        return Ok(Vec::new());
    };

    let list = ctx.data.get(context_name).ok_or_else(|| {
        Error::Config(format!(
            "config context '{}' has no '{}' key",
            context_name, context_name
        ))
    })?;

    let mut zones = serde_json::to_value(list)
        .and_then(serde_json::from_value::<Vec<Zone>>)
        .map_err(|e| {
            Error::Config(format!(
                "config context '{}' holds a malformed zone list: {}",
                context_name, e
            ))
        })?;

    // zone data usually spells names fully qualified
    for zone in &mut zones {
        zone.name = zone.name.trim_end_matches('.').to_string();
    }

    Ok(zones)
}

/// The part of `fqdn` left of `.zone`, matched on a label boundary,
/// ignoring ASCII case.
fn relative_name<'a>(fqdn: &'a str, zone: &str) -> Option<&'a str> {
    let cut = fqdn.len().checked_sub(zone.len() + 1)?;
    if cut == 0 || !fqdn.is_char_boundary(cut) {
        return None;
    }
    let (host, rest) = fqdn.split_at(cut);
    (rest.starts_with('.') && rest[1..].eq_ignore_ascii_case(zone)).then_some(host)
}

/// Add one record per address whose DNS name lies within `zone`.
pub fn add_host_records(zone: &mut Zone, addresses: &[IpAddress]) {
    let origin = zone.name.trim_end_matches('.').to_string();
    if origin.is_empty() {
        return;
    }

    for ip in addresses {
        let fqdn = ip.dns_name.trim_end_matches('.');
        let name = if fqdn.eq_ignore_ascii_case(&origin) {
            "@"
        } else {
            match relative_name(fqdn, &origin) {
                Some(host) => host,
                None => continue,
            }
        };

        zone.records.push(ZoneRecord {
            name: name.to_string(),
            kind: if ip.address.is_ipv6() { "AAAA" } else { "A" }.to_string(),
            value: ip.address.to_string(),
        });
    }
}

impl Generator {
    /// Write `<out>/db.<zone>` for every configured forward zone.
    pub fn forward_dns(&self, serial: u32) -> Result<Vec<PathBuf>> {
        let settings = &self.config().dns;
        let contexts = self.inventory().config_contexts()?;
        let addresses = self.inventory().ip_addresses()?;

        let mut zones = zones_from_contexts(&contexts, &settings.zones_context)?;
        let dir = self.prepare_dir(None)?;

        let mut written = Vec::with_capacity(zones.len());
        for zone in &mut zones {
            let stem = file_stem("zone", &zone.name)?;
            add_host_records(zone, &addresses);
            debug!("zone {} has {} records", zone.name, zone.records.len());

            let rendered = self.render(
                ZONE_TEMPLATE_NAME,
                ZoneView {
                    zone: &zone.name,
                    serial,
                    dns: settings,
                    records: &zone.records,
                },
            )?;
            written.push(writer::write_atomic(
                &dir.join(format!("db.{}", stem)),
                rendered.as_bytes(),
            )?);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::ConfigValue;
    use serde_json::json;

    fn context(name: &str, data: serde_json::Value) -> ConfigContext {
        ConfigContext {
            name: name.to_string(),
            weight: 1000,
            scopes: Vec::new(),
            data: ConfigValue::from(data),
        }
    }

    fn address(addr: &str, dns_name: &str) -> IpAddress {
        let (address, network) = crate::inventory::network::parse_cidr(addr).unwrap();
        IpAddress {
            address,
            network,
            dns_name: dns_name.to_string(),
            tenant: "as65342".to_string(),
        }
    }

    #[test]
    fn test_zones_from_contexts() {
        let contexts = vec![
            context("centos", json!({"ntp": "x"})),
            context(
                "dns_zones",
                json!({"dns_zones": [{"name": "as65342.net", "records": [
                    {"name": "www", "type": "CNAME", "value": "web01"}
                ]}]}),
            ),
        ];
        let zones = zones_from_contexts(&contexts, "dns_zones").unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].records[0].kind, "CNAME");
    }

    #[test]
    fn test_malformed_zone_list() {
        let contexts = vec![context("dns_zones", json!({"dns_zones": [{"records": []}]}))];
        assert!(matches!(
            zones_from_contexts(&contexts, "dns_zones"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_context_means_no_zones() {
        assert!(zones_from_contexts(&[], "dns_zones").unwrap().is_empty());
    }

    #[test]
    fn test_host_records_respect_label_boundary() {
        let mut zone = Zone {
            name: "as65342.net".to_string(),
            records: Vec::new(),
        };
        let addresses = vec![
            address("10.0.1.10/24", "web01.as65342.net"),
            address("2001:db8::10/64", "web01.as65342.net."),
            address("10.0.1.11/24", "web02.notas65342.net"),
            address("10.0.1.12/24", ""),
        ];
        add_host_records(&mut zone, &addresses);

        let lines: Vec<_> = zone
            .records
            .iter()
            .map(|r| format!("{} {} {}", r.name, r.kind, r.value))
            .collect();
        assert_eq!(lines, vec!["web01 A 10.0.1.10", "web01 AAAA 2001:db8::10"]);
    }

    #[test]
    fn test_fully_qualified_zone_name_matches_hosts() {
        let mut zone = Zone {
            name: "as65342.net.".to_string(),
            records: Vec::new(),
        };
        add_host_records(
            &mut zone,
            &[
                address("10.0.1.10/24", "web01.as65342.net"),
                address("10.0.1.11/24", "DB01.AS65342.NET."),
                address("10.0.1.1/24", "as65342.net"),
            ],
        );

        let names: Vec<_> = zone.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["web01", "DB01", "@"]);
    }

    #[test]
    fn test_zone_names_lose_trailing_dot() {
        let contexts = vec![context(
            "dns_zones",
            json!({"dns_zones": [{"name": "as65342.net."}]}),
        )];
        let zones = zones_from_contexts(&contexts, "dns_zones").unwrap();
        assert_eq!(zones[0].name, "as65342.net");
    }

    #[test]
    fn test_relative_name_edges() {
        assert_eq!(relative_name("a.b.example.org", "example.org"), Some("a.b"));
        assert_eq!(relative_name(".example.org", "example.org"), None);
        assert_eq!(relative_name("xexample.org", "example.org"), None);
        assert_eq!(relative_name("org", "example.org"), None);
        assert_eq!(relative_name("hé.example.org", "example.org"), Some("hé"));
    }

    #[test]
    fn test_serial_fits_soa_field() {
        assert!(serial_now() > 1_600_000_000);
    }
}
