//! # nbgen - Configuration generation from a NetBox inventory
//!
//! nbgen reads a NetBox-style source of truth (devices, virtual machines,
//! prefixes, IP addresses, tenants and config contexts) and renders it into
//! the files other systems consume: an Ansible inventory, an Icinga2
//! configuration, forward DNS zones, a backup host list and a Rundeck node
//! list.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CLI (main.rs)                          │
//! │           flags + config files + env → Config                 │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     generate::Generator                       │
//! │    ansible │ icinga2 │ dns │ backup │ rundeck  (minijinja)    │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     inventory::Inventory                      │
//! │      policy filters, address parsing, gateway derivation      │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     netbox::NetboxClient                      │
//! │        one request per collection, cached snapshots           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use nbgen::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let client = NetboxClient::new(&config.netbox)?;
//!     let inventory = Inventory::new(client, config.policy.clone());
//!
//!     let generator = Generator::new(inventory, config, "/srv/icinga2")?;
//!     for path in generator.generate(Mode::Icinga2)? {
//!         println!("wrote {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::generate::{Generator, Mode};
    pub use crate::inventory::{
        ConfigContext, ConfigValue, Gateway, Inventory, IpAddress, ManagedDevice, Policy, Tenant,
    };
    pub use crate::netbox::{Collection, NetboxClient, Transport};
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types
pub mod error;

/// Configuration loading
pub mod config;

// ============================================================================
// Inventory
// ============================================================================

/// Inventory service client and response cache
pub mod netbox;

/// Normalized inventory model
pub mod inventory;

// ============================================================================
// Output
// ============================================================================

/// Artifact generators
pub mod generate;

pub use error::{Error, Result};
