//! Artifact generators.
//!
//! A [`Generator`] wraps an [`Inventory`] and an output directory, and renders
//! the normalized model into files:
//!
//! | mode      | artifacts                                             |
//! |-----------|-------------------------------------------------------|
//! | `ansible` | `hosts`, `group_vars/<context>.json`, `host_vars/<host>.json` |
//! | `icinga2` | `generated.conf`                                      |
//! | `dns`     | `db.<zone>` per forward zone                          |
//! | `backup`  | `backup.hosts`                                        |
//! | `rundeck` | `hosts.yml`                                           |
//!
//! Every file is written through [`writer::write_atomic`], so readers of the
//! output directory never observe a half-written artifact.

pub mod ansible;
pub mod backup;
pub mod dns;
pub mod icinga2;
pub mod rundeck;
pub mod writer;

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use minijinja::Environment;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::inventory::Inventory;

/// What to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Ansible inventory plus group and host variables
    Ansible,
    /// Icinga2 monitoring configuration
    Icinga2,
    /// Forward DNS zone files
    #[value(alias = "rdns")]
    Dns,
    /// Flat backup host listing
    Backup,
    /// Rundeck node listing
    Rundeck,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Ansible => "ansible",
            Mode::Icinga2 => "icinga2",
            Mode::Dns => "dns",
            Mode::Backup => "backup",
            Mode::Rundeck => "rundeck",
        };
        f.write_str(name)
    }
}

/// Header fields shared by the text templates.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Provenance {
    pub generated_on: String,
    pub generated_by: String,
}

/// Renders inventory data into artifacts under one output directory.
#[derive(Debug)]
pub struct Generator {
    inventory: Inventory,
    config: Config,
    out: PathBuf,
    username: String,
    templates: Environment<'static>,
}

impl Generator {
    /// Create a generator writing below `out`.
    pub fn new(inventory: Inventory, config: Config, out: impl Into<PathBuf>) -> Result<Self> {
        let mut templates = Environment::new();
        templates.set_trim_blocks(true);
        templates.set_lstrip_blocks(true);
        templates.set_keep_trailing_newline(true);
        templates.add_filter(icinga2::ESCAPE_FILTER, icinga2::escape_str);

        for (name, source) in [
            (ansible::INVENTORY_TEMPLATE_NAME, ansible::INVENTORY_TEMPLATE),
            (icinga2::TEMPLATE_NAME, icinga2::TEMPLATE),
            (dns::ZONE_TEMPLATE_NAME, dns::ZONE_TEMPLATE),
        ] {
            templates
                .add_template(name, source)
                .map_err(|e| Error::template(name, &e))?;
        }

        Ok(Self {
            inventory,
            config,
            out: out.into(),
            username: current_user(),
            templates,
        })
    }

    /// Override the user named in generated headers.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn out_dir(&self) -> &Path {
        &self.out
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Run every step of `mode`, stopping at the first failure.
    pub fn generate(&self, mode: Mode) -> Result<Vec<PathBuf>> {
        info!("generating {} artifacts into {}", mode, self.out.display());
        let written = match mode {
            Mode::Ansible => self.ansible()?,
            Mode::Icinga2 => vec![self.icinga2_config()?],
            Mode::Dns => self.forward_dns(dns::serial_now())?,
            Mode::Backup => vec![self.backup_hosts()?],
            Mode::Rundeck => vec![self.rundeck_hosts()?],
        };
        debug!("{} wrote {} files", mode, written.len());
        Ok(written)
    }

    pub(crate) fn provenance(&self) -> Provenance {
        Provenance {
            generated_on: chrono::Local::now().format("%Y-%m-%d %H:%M:%S %Z").to_string(),
            generated_by: self.username.clone(),
        }
    }

    pub(crate) fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        self.templates
            .get_template(name)
            .and_then(|tmpl| tmpl.render(ctx))
            .map_err(|e| Error::template(name, &e))
    }

    /// Directory below the output root, created on demand.
    pub(crate) fn prepare_dir(&self, sub: Option<&str>) -> Result<PathBuf> {
        let dir = match sub {
            Some(sub) => self.out.join(sub),
            None => self.out.clone(),
        };
        writer::ensure_dir(&dir)?;
        Ok(dir)
    }
}

/// Reject names that would escape their directory when used as a file name.
pub(crate) fn file_stem(kind: &str, name: &str) -> Result<String> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(Error::Config(format!(
            "{} name '{}' cannot be used as a file name",
            kind, name
        )));
    }
    Ok(name.to_string())
}

/// Full name of the invoking user, falling back to the login name.
#[cfg(unix)]
pub fn current_user() -> String {
    use nix::unistd::{Uid, User};

    match User::from_uid(Uid::current()) {
        Ok(Some(user)) => {
            let gecos = user.gecos.to_string_lossy();
            let full_name = gecos.split(',').next().unwrap_or_default().trim();
            if full_name.is_empty() {
                user.name
            } else {
                full_name.to_string()
            }
        }
        _ => std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
    }
}

#[cfg(not(unix))]
pub fn current_user() -> String {
    std::env::var("USERNAME").unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_display_matches_cli_names() {
        for mode in Mode::value_variants() {
            let parsed = Mode::from_str(&mode.to_string(), false).unwrap();
            assert_eq!(parsed, *mode);
        }
    }

    #[test]
    fn test_rdns_alias() {
        assert_eq!(Mode::from_str("rdns", false).unwrap(), Mode::Dns);
    }

    #[test]
    fn test_file_stem_rejects_traversal() {
        assert!(file_stem("host", "web01.as65342.net").is_ok());
        assert!(file_stem("host", "../etc/passwd").is_err());
        assert!(file_stem("host", "").is_err());
        assert!(file_stem("context", "..").is_err());
    }

    #[test]
    fn test_current_user_is_never_empty() {
        assert!(!current_user().is_empty());
    }
}
