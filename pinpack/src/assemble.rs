//! Package assembly
//!
//! Copies a selected file set into the target package layout, preserving
//! relative paths under the declared prefix (`include/` by default). A copy
//! failure may leave partial files behind; the whole operation is then
//! reported failed, never a silent partial success.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Copy every file in `files` (relative to `source_root`) to
/// `<package_root>/<prefix>/<relative path>`. Returns the number of files
/// placed.
pub fn assemble(
    source_root: &Path,
    files: &[PathBuf],
    package_root: &Path,
    prefix: &str,
) -> Result<usize> {
    let layout_root = package_root.join(prefix);

    for rel in files {
        let src = source_root.join(rel);
        let dst = layout_root.join(rel);

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::Copy {
                path: dst.clone(),
                reason: err.to_string(),
            })?;
        }

        fs::copy(&src, &dst).map_err(|err| Error::Copy {
            path: src.clone(),
            reason: err.to_string(),
        })?;
        tracing::debug!("Copied {:?} -> {:?}", src, dst);
    }

    Ok(files.len())
}
