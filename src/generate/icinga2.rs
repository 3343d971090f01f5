//! Icinga2 monitoring configuration.

use std::path::PathBuf;

use indexmap::IndexSet;
use serde::Serialize;

use super::{writer, Generator, Provenance};
use crate::config::MonitoringConfig;
use crate::error::Result;
use crate::inventory::{Gateway, ManagedDevice, Tenant};

pub(crate) const TEMPLATE_NAME: &str = "icinga2/generated.conf";

pub(crate) const TEMPLATE: &str = r#"#
# Generated on {{ generated_on }} by {{ generated_by }}
#
{% for tenant in tenants %}

template Host "{{ tenant.slug|icinga_str }}-gateway" {
  max_check_attempts = {{ monitoring.max_check_attempts }}
  check_interval = {{ monitoring.check_interval }}
  retry_interval = {{ monitoring.retry_interval }}

  check_command = "hostalive"
}

template Host "{{ tenant.slug|icinga_str }}-host" {
  max_check_attempts = {{ monitoring.max_check_attempts }}
  check_interval = {{ monitoring.check_interval }}
  retry_interval = {{ monitoring.retry_interval }}

  check_command = "hostalive"
}

template Service "{{ tenant.slug|icinga_str }}-service" {
  max_check_attempts = {{ monitoring.max_check_attempts }}
  check_interval = {{ monitoring.check_interval }}
  retry_interval = {{ monitoring.retry_interval }}
}

object HostGroup "{{ tenant.slug|icinga_str }}-servers" {
  display_name = "{{ tenant.name|icinga_str }} Servers"
  assign where host.vars.tenant == "{{ tenant.slug|icinga_str }}"
}
{% endfor %}
{% for platform in platforms %}

object HostGroup "{{ platform|icinga_str }}-servers" {
  display_name = "{{ platform|icinga_str }} Servers"
  assign where host.vars.platform == "{{ platform|icinga_str }}"
}
{% endfor %}
{% for site in sites %}

object HostGroup "site-{{ site|icinga_str }}-servers" {
  display_name = "{{ site|icinga_str }} Servers"
  assign where host.vars.site == "{{ site|icinga_str }}"
}
{% endfor %}
{% for gw in gateways %}

object Host "gw-{{ gw.printable_address }}" {
  import "{{ gw.tenant|icinga_str }}-gateway"
  {{ gw.address_attr }} = "{{ gw.address }}"
  display_name = "gw-{{ gw.printable_address }}"
}

apply Dependency "host-to-gw-{{ gw.printable_address }}" to Host {
  parent_host_name = "gw-{{ gw.printable_address }}"
  disable_checks = true
  disable_notifications = true

  assign where host.vars.{{ gw.network_var }} == "net-{{ gw.printable_network }}"
}

apply Dependency "service-to-gw-{{ gw.printable_address }}" to Service {
  parent_host_name = "gw-{{ gw.printable_address }}"
  parent_service_name = "{{ gw.ping }}"

  disable_checks = true
  disable_notifications = true

  assign where host.vars.{{ gw.network_var }} == "net-{{ gw.printable_network }}"
}
{% endfor %}
{% for host in hosts %}

object Host "{{ host.name|icinga_str }}" {
  import "{{ host.tenant|icinga_str }}-host"

{% if host.address6 %}
  address6 = "{{ host.address6 }}"
{% endif %}
{% if host.address %}
  address = "{{ host.address }}"
{% endif %}

  vars.platform = "{{ host.platform|icinga_str }}"
  vars.tenant = "{{ host.tenant|icinga_str }}"
  vars.site = "{{ host.site|icinga_str }}"
{% if host.network6 %}
  vars.network6 = "net-{{ host.network6 }}"
{% endif %}
{% if host.network %}
  vars.network = "net-{{ host.network }}"
{% endif %}

  vars.http_vhosts["{{ host.name|icinga_str }}"] = {
    http_vhost  = "{{ host.name|icinga_str }}"
    http_port   = 443
    http_ssl    = true
    http_sni    = true
    http_uri    = "{{ monitoring.vhost_uri|icinga_str }}"
    http_string = "{{ monitoring.vhost_string|icinga_str }}"
  }
}
{% endfor %}
"#;

/// Name of the filter escaping values placed inside Icinga2 string literals.
pub(crate) const ESCAPE_FILTER: &str = "icinga_str";

/// Escape `value` for use between double quotes in Icinga2 configuration.
pub fn escape_str(value: String) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Serialize)]
struct GatewayView {
    address: String,
    printable_address: String,
    printable_network: String,
    tenant: String,
    address_attr: &'static str,
    network_var: &'static str,
    ping: &'static str,
}

impl From<&Gateway> for GatewayView {
    fn from(gw: &Gateway) -> Self {
        let (address_attr, network_var, ping) = if gw.is_ipv6() {
            ("address6", "network6", "ping6")
        } else {
            ("address", "network", "ping4")
        };
        Self {
            address: gw.address.to_string(),
            printable_address: gw.printable_address.clone(),
            printable_network: gw.printable_network.clone(),
            tenant: gw.tenant.clone(),
            address_attr,
            network_var,
            ping,
        }
    }
}

#[derive(Debug, Serialize)]
struct HostView {
    name: String,
    tenant: String,
    platform: String,
    site: String,
    address: Option<String>,
    address6: Option<String>,
    network: Option<String>,
    network6: Option<String>,
}

impl From<&ManagedDevice> for HostView {
    fn from(device: &ManagedDevice) -> Self {
        Self {
            name: device.name.clone(),
            tenant: device.tenant.clone(),
            platform: device.platform.clone(),
            site: device.site.clone(),
            address: device.primary_ip4().map(|ip| ip.to_string()),
            address6: device.primary_ip6().map(|ip| ip.to_string()),
            network: device.primary4.as_ref().map(|p| p.printable_network.clone()),
            network6: device.primary6.as_ref().map(|p| p.printable_network.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ConfigView<'a> {
    #[serde(flatten)]
    provenance: Provenance,
    monitoring: &'a MonitoringConfig,
    tenants: Vec<Tenant>,
    platforms: IndexSet<String>,
    sites: IndexSet<String>,
    gateways: Vec<GatewayView>,
    hosts: Vec<HostView>,
}

impl Generator {
    /// Write `<out>/generated.conf`.
    pub fn icinga2_config(&self) -> Result<PathBuf> {
        let gateways = self.inventory().gateways()?;
        let tenants = self.inventory().tenants()?;
        let devices = self.inventory().devices()?;

        // IPv4 gateways first, each family in derivation order
        let (v6, v4): (Vec<_>, Vec<_>) = gateways.iter().partition(|gw| gw.is_ipv6());

        let view = ConfigView {
            provenance: self.provenance(),
            monitoring: &self.config().monitoring,
            tenants,
            platforms: devices.iter().map(|d| d.platform.clone()).collect(),
            sites: devices
                .iter()
                .filter(|d| !d.site.is_empty())
                .map(|d| d.site.clone())
                .collect(),
            gateways: v4.into_iter().chain(v6).map(GatewayView::from).collect(),
            hosts: devices.iter().map(HostView::from).collect(),
        };

        let rendered = self.render(TEMPLATE_NAME, view)?;
        let dir = self.prepare_dir(None)?;
        writer::write_atomic(&dir.join("generated.conf"), rendered.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_str() {
        assert_eq!(escape_str("AS65342".into()), "AS65342");
        assert_eq!(escape_str(r#"ACME "Labs""#.into()), r#"ACME \"Labs\""#);
        assert_eq!(escape_str(r"C:\sites".into()), r"C:\\sites");
        assert_eq!(escape_str("two\nlines".into()), r"two\nlines");
    }
}
