//! Single doorway to git.
//!
//! The export phase resolves the live working copy (HEAD commit, remote URL,
//! dirty state) and the source phase reproduces a pinned tree with exactly
//! two primitives: clone then checkout. No other module runs git.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use pinpack_recipe::RevisionPin;
use tempfile::TempDir;

use crate::error::{Error, Result};

/// Verify the git binary is reachable before starting the pipeline.
pub fn ensure_git() -> Result<()> {
    which::which("git").map_err(|_| Error::GitMissing)?;
    Ok(())
}

fn run_git(dir: Option<&Path>, args: &[&str]) -> std::result::Result<String, String> {
    let mut cmd = Command::new("git");
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    let output = cmd
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| err.to_string())?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            Err(format!("git {} exited with {}", args.join(" "), output.status))
        } else {
            Err(stderr)
        }
    }
}

/// Capture a revision pin from a live, checked-out working copy.
///
/// The revision always reflects the exact HEAD commit. The URL prefers the
/// recipe's declared value over the detected remote; the detected remote is
/// only required when nothing was declared.
pub fn capture_pin(workdir: &Path, declared_url: Option<&str>) -> Result<RevisionPin> {
    let head = run_git(Some(workdir), &["rev-parse", "HEAD"]).map_err(|reason| {
        Error::UnresolvedRevision {
            dir: workdir.to_path_buf(),
            reason,
        }
    })?;

    let status =
        run_git(Some(workdir), &["status", "--porcelain"]).map_err(|reason| {
            Error::UnresolvedRevision {
                dir: workdir.to_path_buf(),
                reason,
            }
        })?;
    if !status.is_empty() {
        return Err(Error::UnresolvedRevision {
            dir: workdir.to_path_buf(),
            reason: "working copy has uncommitted changes".to_string(),
        });
    }

    let detected = run_git(Some(workdir), &["remote", "get-url", "origin"]).ok();

    let url = match (declared_url, detected) {
        (Some(declared), detected) => {
            if let Some(detected) = detected {
                if detected != declared {
                    tracing::debug!(
                        "Declared URL {} overrides detected remote {}",
                        declared,
                        detected
                    );
                }
            }
            declared.to_string()
        }
        (None, Some(detected)) => detected,
        (None, None) => {
            return Err(Error::UnresolvedRevision {
                dir: workdir.to_path_buf(),
                reason: "remote URL cannot be determined and none is declared".to_string(),
            })
        }
    };

    Ok(RevisionPin::new(url, head))
}

/// An ephemeral checked-out tree, exclusively owned by the fetch that
/// created it. Temp-backed trees are reclaimed on drop.
#[derive(Debug)]
pub struct WorkingTree {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl WorkingTree {
    /// Create a fresh temp-backed tree.
    pub fn ephemeral() -> Result<Self> {
        let temp = tempfile::Builder::new().prefix("pinpack-").tempdir()?;
        Ok(WorkingTree {
            root: temp.path().to_path_buf(),
            temp: Some(temp),
        })
    }

    /// Use a caller-supplied directory. Never reclaimed by us.
    pub fn at(path: PathBuf) -> Self {
        WorkingTree {
            root: path,
            temp: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Give up ownership so the tree survives this run.
    pub fn keep(mut self) -> PathBuf {
        if let Some(temp) = self.temp.take() {
            temp.keep()
        } else {
            self.root.clone()
        }
    }
}

/// Reproduce the exact tree at {url, revision} into `target`.
///
/// Two-stage protocol: full clone of the repository, then checkout of the
/// pinned revision. The full clone (never shallow) guarantees the pinned
/// commit is reachable regardless of what the default branch has become.
/// After checkout, HEAD is verified against the pin.
pub fn fetch(pin: &RevisionPin, target: &Path) -> Result<()> {
    if target.exists() {
        let occupied = fs::read_dir(target)?.next().is_some();
        if occupied {
            return Err(Error::Clone {
                url: pin.url.clone(),
                target: target.to_path_buf(),
                reason: "target directory is not empty".to_string(),
            });
        }
    }

    let target_str = target.to_string_lossy();
    tracing::info!("Cloning {} into {}", pin.url, target_str);
    run_git(None, &["clone", &pin.url, &target_str]).map_err(|reason| Error::Clone {
        url: pin.url.clone(),
        target: target.to_path_buf(),
        reason,
    })?;

    tracing::info!("Checking out {}", pin.revision);
    run_git(Some(target), &["checkout", "--detach", &pin.revision]).map_err(|reason| {
        Error::Checkout {
            revision: pin.revision.clone(),
            url: pin.url.clone(),
            reason,
        }
    })?;

    let head = run_git(Some(target), &["rev-parse", "HEAD"]).map_err(|reason| Error::Checkout {
        revision: pin.revision.clone(),
        url: pin.url.clone(),
        reason,
    })?;
    // The pin may be a full hash, an abbreviated hash, a tag or a branch;
    // all of them resolve to exactly one commit through rev-parse.
    let pinned = run_git(
        Some(target),
        &["rev-parse", &format!("{}^{{commit}}", pin.revision)],
    )
    .map_err(|reason| Error::Checkout {
        revision: pin.revision.clone(),
        url: pin.url.clone(),
        reason,
    })?;
    if head != pinned {
        return Err(Error::Checkout {
            revision: pin.revision.clone(),
            url: pin.url.clone(),
            reason: format!("checked out HEAD {} does not match the pin", head),
        });
    }

    Ok(())
}
