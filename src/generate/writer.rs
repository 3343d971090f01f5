//! Output directory handling and atomic file writes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Create `dir` (and parents) unless it already exists as a directory.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::OutputDir {
            path: dir.to_path_buf(),
            message: "exists but is not a directory".to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("creating output directory {}", dir.display());
            fs::create_dir_all(dir).map_err(|e| Error::OutputDir {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })
        }
        Err(e) => Err(Error::OutputDir {
            path: dir.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

/// Write `contents` to `path` through a temporary file in the same
/// directory, renamed over the target once fully written.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<PathBuf> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let write_err = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".nbgen-")
        .suffix(".new")
        .tempfile_in(dir)
        .map_err(write_err)?;

    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o644)).map_err(write_err)?;
    }

    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("wrote {} ({} bytes)", path.display(), contents.len());
    Ok(path.to_path_buf())
}
