//! CLI module for nbgen
//!
//! Argument parsing and the mapping of flags onto the loaded configuration.

pub mod output;

use clap::Parser;
use nbgen::config::Config;
use nbgen::generate::Mode;
use std::path::PathBuf;

/// nbgen - generate configuration from a NetBox inventory
///
/// Queries the inventory service and renders Ansible, Icinga2, DNS, backup
/// or Rundeck artifacts into an output directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "nbgen")]
#[command(version)]
#[command(about = "Generate configuration artifacts from a NetBox inventory", long_about = None)]
pub struct Cli {
    /// Directory to write artifacts into
    #[arg(short = 'o', long)]
    pub out: PathBuf,

    /// What to generate
    #[arg(short = 'g', long)]
    pub generate: Mode,

    /// API host[:port]
    #[arg(long, env = "NETBOX_HOST")]
    pub api: Option<String>,

    /// API token
    #[arg(long, env = "NETBOX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Talk plain http to the API
    #[arg(long)]
    pub notls: bool,

    /// Page size for list requests
    #[arg(long)]
    pub limit: Option<u32>,

    /// Path to configuration file
    #[arg(short = 'c', long, env = "NBGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Apply flags on top of file and environment configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(api) = self.api.as_ref().filter(|a| !a.is_empty()) {
            config.netbox.host = api.clone();
        }
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            config.netbox.token = token.clone();
        }
        if self.notls {
            config.netbox.tls = false;
        }
        if let Some(limit) = self.limit {
            config.netbox.limit = limit;
        }
    }
}
