//! Rundeck resource model (`hosts.yml`).

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use super::{writer, Generator};
use crate::error::Result;
use crate::inventory::ManagedDevice;

/// One Rundeck node entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RundeckNode {
    pub hostname: String,
    pub username: String,
    pub os_family: String,
    pub os_name: String,
}

impl From<&ManagedDevice> for RundeckNode {
    fn from(device: &ManagedDevice) -> Self {
        let username = match device.platform.as_str() {
            "coreos" => "core",
            _ => "rundeck",
        };
        let os_family = match device.platform.as_str() {
            "openbsd" => "bsd",
            _ => "linux",
        };
        Self {
            hostname: device.name.clone(),
            username: username.to_string(),
            os_family: os_family.to_string(),
            os_name: device.platform.clone(),
        }
    }
}

/// Nodes keyed by short hostname; a later device with the same short name wins.
pub fn rundeck_nodes(devices: &[ManagedDevice]) -> IndexMap<String, RundeckNode> {
    devices
        .iter()
        .map(|d| (d.short_name().to_string(), RundeckNode::from(d)))
        .collect()
}

impl Generator {
    /// Write `<out>/hosts.yml`.
    pub fn rundeck_hosts(&self) -> Result<PathBuf> {
        let devices = self.inventory().devices()?;
        let yaml = serde_yaml::to_string(&rundeck_nodes(&devices))?;
        let dir = self.prepare_dir(None)?;
        writer::write_atomic(&dir.join("hosts.yml"), yaml.as_bytes())
    }
}
