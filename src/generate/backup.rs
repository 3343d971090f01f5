//! Flat host listing consumed by the backup jobs.

use std::io;
use std::path::PathBuf;

use super::{writer, Generator};
use crate::error::Result;
use crate::inventory::ManagedDevice;

/// `name,platform,site` lines without a header row.
pub fn backup_listing(devices: &[ManagedDevice]) -> Result<Vec<u8>> {
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    for device in devices {
        out.write_record([&device.name, &device.platform, &device.site])
            .map_err(io::Error::from)?;
    }

    Ok(out.into_inner().map_err(|e| e.into_error())?)
}

impl Generator {
    /// Write `<out>/backup.hosts`.
    pub fn backup_hosts(&self) -> Result<PathBuf> {
        let devices = self.inventory().devices()?;
        let listing = backup_listing(&devices)?;
        let dir = self.prepare_dir(None)?;
        writer::write_atomic(&dir.join("backup.hosts"), &listing)
    }
}
