//! Ansible inventory, group variables and host variables.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use super::{file_stem, writer, Generator, Provenance};
use crate::error::Result;
use crate::inventory::{ConfigValue, ManagedDevice};

pub(crate) const INVENTORY_TEMPLATE_NAME: &str = "ansible/hosts";

pub(crate) const INVENTORY_TEMPLATE: &str = r#"#
# Generated on {{ generated_on }} by {{ generated_by }}
#
[all:vars]
ansible_connection = {{ connection }}
ansible_user = {{ user }}
ansible_become_pass = {{ become_pass }}

[all]
{% for host in hosts %}
{{ host }}
{% endfor %}
{% for group in groups %}

[{{ group.name }}]
{% for host in group.hosts %}
{{ host }}
{% endfor %}
{% endfor %}
"#;

#[derive(Debug, Serialize)]
struct Group {
    name: String,
    hosts: Vec<String>,
}

#[derive(Debug, Serialize)]
struct InventoryView {
    #[serde(flatten)]
    provenance: Provenance,
    connection: String,
    user: String,
    become_pass: String,
    hosts: Vec<String>,
    groups: Vec<Group>,
}

/// Inventory sections: platforms, then sites, then tags, each sorted by name.
fn groups(devices: &[ManagedDevice]) -> Vec<Group> {
    let mut platforms: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut sites: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut tags: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for device in devices {
        platforms.entry(&device.platform).or_default().push(device.name.clone());
        if !device.site.is_empty() {
            sites.entry(&device.site).or_default().push(device.name.clone());
        }
        for tag in &device.tags {
            tags.entry(tag).or_default().push(device.name.clone());
        }
    }

    [platforms, sites, tags]
        .into_iter()
        .flatten()
        .map(|(name, hosts)| Group {
            name: name.to_string(),
            hosts,
        })
        .collect()
}

/// Device variables: its config mapping plus inventory facts.
pub fn host_vars(device: &ManagedDevice) -> ConfigValue {
    let address = |ip: Option<std::net::IpAddr>| ConfigValue::from(ip.map(|ip| ip.to_string()));

    let mut vars = device.config.clone().into_mapping();
    vars.insert("primary_ip".into(), address(device.primary_ip()));
    vars.insert("primary_ip4".into(), address(device.primary_ip4()));
    vars.insert("primary_ip6".into(), address(device.primary_ip6()));
    vars.insert("tenant".into(), device.tenant.as_str().into());
    vars.insert("platform".into(), device.platform.as_str().into());
    vars.insert("site".into(), device.site.as_str().into());
    ConfigValue::Mapping(vars)
}

impl Generator {
    /// Inventory, group vars and host vars, in that order.
    pub fn ansible(&self) -> Result<Vec<PathBuf>> {
        let mut written = vec![self.ansible_inventory()?];
        written.extend(self.ansible_group_vars()?);
        written.extend(self.ansible_host_vars()?);
        Ok(written)
    }

    /// Write `<out>/hosts`.
    pub fn ansible_inventory(&self) -> Result<PathBuf> {
        let devices = self.inventory().devices()?;
        let settings = &self.config().ansible;

        let view = InventoryView {
            provenance: self.provenance(),
            connection: settings.connection.clone(),
            user: settings.user.clone(),
            become_pass: format!("{{{{ {} }}}}", settings.become_pass_var),
            hosts: devices.iter().map(|d| d.name.clone()).collect(),
            groups: groups(&devices),
        };

        let rendered = self.render(INVENTORY_TEMPLATE_NAME, view)?;
        let dir = self.prepare_dir(None)?;
        writer::write_atomic(&dir.join("hosts"), rendered.as_bytes())
    }

    /// Write one `<out>/group_vars/<context>.json` per config context.
    pub fn ansible_group_vars(&self) -> Result<Vec<PathBuf>> {
        let contexts = self.inventory().config_contexts()?;
        let dir = self.prepare_dir(Some("group_vars"))?;

        let mut written = Vec::with_capacity(contexts.len());
        for ctx in &contexts {
            let stem = file_stem("config context", &ctx.name)?;
            let data = serde_json::to_vec(&ctx.data)?;
            written.push(writer::write_atomic(&dir.join(format!("{}.json", stem)), &data)?);
        }

        debug!("wrote {} group_vars files", written.len());
        Ok(written)
    }

    /// Write one `<out>/host_vars/<device>.json` per managed device.
    pub fn ansible_host_vars(&self) -> Result<Vec<PathBuf>> {
        let devices = self.inventory().devices()?;
        let dir = self.prepare_dir(Some("host_vars"))?;

        let mut written = Vec::with_capacity(devices.len());
        for device in &devices {
            let stem = file_stem("device", &device.name)?;
            let data = serde_json::to_vec(&host_vars(device))?;
            written.push(writer::write_atomic(&dir.join(format!("{}.json", stem)), &data)?);
        }

        debug!("wrote {} host_vars files", written.len());
        Ok(written)
    }
}
