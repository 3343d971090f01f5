//! Configuration module for nbgen
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/nbgen/nbgen.toml)
//! - User configuration (~/.config/nbgen/nbgen.toml)
//! - Project configuration (./nbgen.toml)
//! - An explicit `--config` file
//! - Environment variables
//!
//! Command-line flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::Error;
use crate::inventory::Policy;
use crate::netbox::DEFAULT_LIMIT;

/// Default API endpoint
pub const DEFAULT_HOST: &str = "localhost:443";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inventory service connection
    pub netbox: NetboxConfig,

    /// Which records are managed
    pub policy: Policy,

    /// Ansible inventory settings
    pub ansible: AnsibleConfig,

    /// DNS zone settings
    pub dns: DnsConfig,

    /// Icinga2 settings
    pub monitoring: MonitoringConfig,
}

/// Inventory service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetboxConfig {
    /// API host, optionally with port
    pub host: String,

    /// API token
    pub token: String,

    /// Use https
    pub tls: bool,

    /// Page size for list requests
    pub limit: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Skip certificate verification
    pub accept_invalid_certs: bool,
}

impl Default for NetboxConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            token: String::new(),
            tls: true,
            limit: DEFAULT_LIMIT,
            timeout_secs: 30,
            accept_invalid_certs: false,
        }
    }
}

impl NetboxConfig {
    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }

    /// API root, always ending in `/api/`.
    pub fn base_url(&self) -> crate::Result<Url> {
        let raw = format!("{}://{}/api/", self.scheme(), self.host.trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| Error::Config(format!("Invalid API host '{}': {}", self.host, e)))
    }
}

/// Ansible inventory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnsibleConfig {
    /// Value of `ansible_connection` in `[all:vars]`
    pub connection: String,

    /// Value of `ansible_user` in `[all:vars]`
    pub user: String,

    /// Variable that `ansible_become_pass` is templated from
    pub become_pass_var: String,
}

impl Default for AnsibleConfig {
    fn default() -> Self {
        Self {
            connection: "ssh".to_string(),
            user: "ansible".to_string(),
            become_pass_var: "ansible_become_pass".to_string(),
        }
    }
}

/// DNS zone settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Zone TTL in seconds
    pub ttl: u32,

    /// SOA primary master
    pub master: String,

    /// SOA responsible mailbox
    pub hostmaster: String,

    /// NS record target
    pub nameserver: String,

    /// MX record target
    pub mail_exchanger: String,

    /// MX preference
    pub mx_priority: u16,

    /// Config context holding the zone definitions
    pub zones_context: String,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            ttl: 60,
            master: "master.as65342.net.".to_string(),
            hostmaster: "hostmaster.as65342.net.".to_string(),
            nameserver: "ns.as65342.net.".to_string(),
            mail_exchanger: "mail.as65342.net.".to_string(),
            mx_priority: 10,
            zones_context: "dns_zones".to_string(),
        }
    }
}

/// Icinga2 settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// `max_check_attempts` of every template
    pub max_check_attempts: u32,

    /// `check_interval` of every template
    pub check_interval: String,

    /// `retry_interval` of every template
    pub retry_interval: String,

    /// URI probed by the vhost check
    pub vhost_uri: String,

    /// String expected in the vhost check response
    pub vhost_string: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            max_check_attempts: 3,
            check_interval: "1m".to_string(),
            retry_interval: "30s".to_string(),
            vhost_uri: "/_status".to_string(),
            vhost_string: "Active connections".to_string(),
        }
    }
}

/// Parse one configuration file into an untyped overlay.
fn read_layer(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // Determine format based on extension
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let layer = match extension {
        "yml" | "yaml" => serde_yaml::from_str(&content)?,
        "json" => serde_json::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        _ => toml::from_str(&content)
            .or_else(|_| serde_yaml::from_str(&content))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
    };

    Ok(layer)
}

/// Overlay `layer` onto `base` key by key; tables merge recursively,
/// everything else is replaced. A null layer (an empty file) changes nothing.
fn merge_layer(base: &mut serde_json::Value, layer: serde_json::Value) {
    use serde_json::Value;

    match (base, layer) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(slot) => merge_layer(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }

        let paths = Self::get_config_paths(config_path);
        let mut config = Self::from_layers(paths.iter().filter(|p| p.exists()))?;

        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check, lowest precedence first
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/nbgen/nbgen.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("nbgen/nbgen.toml"));
        }

        paths.push(PathBuf::from("nbgen.toml"));

        if let Some(path) = explicit_path {
            paths.push(path.clone());
        }

        paths
    }

    /// Load a single file on top of the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_layers([path.as_ref()])
    }

    /// Layer files in order, later keys overriding earlier ones, then fill
    /// whatever none of them set from the defaults.
    pub fn from_layers<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut merged = serde_json::Value::Object(serde_json::Map::new());
        for path in paths {
            let path = path.as_ref();
            merge_layer(&mut merged, read_layer(path)?);
            tracing::debug!("loaded config layer {}", path.display());
        }

        serde_json::from_value(merged).context("Invalid configuration")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // NETBOX_HOST
        if let Ok(host) = std::env::var("NETBOX_HOST") {
            if !host.is_empty() {
                self.netbox.host = host;
            }
        }

        // NETBOX_TOKEN
        if let Ok(token) = std::env::var("NETBOX_TOKEN") {
            if !token.is_empty() {
                self.netbox.token = token;
            }
        }

        // NBGEN_LIMIT
        if let Ok(limit) = std::env::var("NBGEN_LIMIT") {
            if let Ok(n) = limit.parse() {
                self.netbox.limit = n;
            }
        }
    }
}
