//! File selection over a working tree
//!
//! Matches glob patterns against the whole tree (not just the top level) and
//! returns relative paths in a deterministic lexicographic order, so the
//! resulting package layout is reproducible and diffable.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Enumerate files under `root` matching the given patterns.
///
/// A bare pattern such as `*.h` applies at every depth; patterns containing
/// a separator are taken relative to the root as written. `.git/` is never
/// part of a package. An empty result is valid here; the caller decides
/// whether that is fatal.
pub fn select_files(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut matched = BTreeSet::new();

    for pattern in patterns {
        let rooted = if pattern.contains('/') {
            root.join(pattern)
        } else {
            root.join("**").join(pattern)
        };
        let rooted = rooted.to_string_lossy().into_owned();

        for entry in glob::glob(&rooted)? {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            if rel.components().any(|c| c.as_os_str() == ".git") {
                continue;
            }
            matched.insert(rel.to_path_buf());
        }
    }

    Ok(matched.into_iter().collect())
}
