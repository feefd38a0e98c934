//! Phase orchestration
//!
//! The pipeline moves through UNINITIALIZED -> PINNED -> FETCHED -> ASSEMBLED,
//! one function per arrow. A failure leaves the prior phase's artifacts
//! intact; retrying a phase always starts it from scratch (a fresh clone
//! target, a fresh copy pass) rather than repairing in place.

use std::path::{Path, PathBuf};

use pinpack_cache::{CacheDatabase, RebuildReason};
use pinpack_recipe::{compute_identity, BuildProfile, Recipe, RevisionPin};

use crate::assemble::assemble;
use crate::error::{Error, Result};
use crate::git::{self, WorkingTree};
use crate::select::select_files;

/// Export phase: capture and persist the revision pin for a recipe.
///
/// Explicitly declared source fields win over detection; anything left as
/// auto is resolved from the live working copy at `workdir`.
pub fn export(recipe_path: &Path, workdir: &Path) -> Result<RevisionPin> {
    let recipe = Recipe::from_file(recipe_path)?;

    let pin = match (&recipe.source.url, &recipe.source.revision) {
        (Some(url), Some(revision)) => RevisionPin::new(url.clone(), revision.clone()),
        _ => {
            let declared = recipe
                .source
                .url
                .as_deref()
                .or(recipe.metadata.url.as_deref());
            let captured = git::capture_pin(workdir, declared)?;
            match &recipe.source.revision {
                Some(revision) => RevisionPin::new(captured.url, revision.clone()),
                None => captured,
            }
        }
    };

    pin.save(&RevisionPin::path_for(recipe_path))?;
    tracing::info!("Pinned {} @ {}", pin.url, pin.revision);
    Ok(pin)
}

/// Source phase: reproduce the pinned tree into a working directory.
///
/// Without an explicit target the tree is temp-backed and reclaimed when
/// dropped. Fails with `PinNotFound` when export never ran.
pub fn fetch_source(recipe_path: &Path, target: Option<PathBuf>) -> Result<WorkingTree> {
    let pin = RevisionPin::load(&RevisionPin::path_for(recipe_path))?;

    let tree = match target {
        Some(path) => WorkingTree::at(path),
        None => WorkingTree::ephemeral()?,
    };
    git::fetch(&pin, tree.root())?;
    Ok(tree)
}

pub struct PackageOptions {
    pub outdir: PathBuf,
    pub profile: BuildProfile,
    pub force: bool,
    pub allow_empty: bool,
    pub cache: Option<PathBuf>,
}

#[derive(Debug)]
pub enum PackageOutcome {
    /// An existing package for this identity was reused as-is.
    Reused { identity: String, path: PathBuf },
    /// A package was assembled from the working tree.
    Assembled {
        identity: String,
        path: PathBuf,
        files: usize,
    },
}

impl PackageOutcome {
    pub fn identity(&self) -> &str {
        match self {
            PackageOutcome::Reused { identity, .. } => identity,
            PackageOutcome::Assembled { identity, .. } => identity,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            PackageOutcome::Reused { path, .. } => path,
            PackageOutcome::Assembled { path, .. } => path,
        }
    }
}

/// Package phase: select files from the fetched tree and copy them into the
/// target layout, unless the reuse cache already holds this identity.
pub fn package(
    recipe_path: &Path,
    worktree_root: &Path,
    opts: &PackageOptions,
) -> Result<PackageOutcome> {
    let recipe = Recipe::from_file(recipe_path)?;
    let identity = compute_identity(&recipe.metadata, recipe.header_only, &opts.profile);

    let db = match &opts.cache {
        Some(path) => Some(CacheDatabase::open(path)?),
        None => None,
    };

    if let Some(db) = &db {
        let decision = db.decide_reuse(&identity, opts.force)?;
        if decision.reusable {
            let path = PathBuf::from(decision.package_path.unwrap_or_default());
            if path.exists() {
                tracing::info!("Reusing packaged artifact at {:?}", path);
                return Ok(PackageOutcome::Reused { identity, path });
            }
            tracing::warn!(
                "Cached artifact {:?} is gone, repackaging ({:?})",
                path,
                RebuildReason::ArtifactMissing {
                    path: path.to_string_lossy().into_owned(),
                }
            );
        } else if let Some(reason) = decision.reason {
            tracing::debug!("Repackaging: {:?}", reason);
        }
    }

    let package_root = opts
        .outdir
        .join(format!("{}-{}", recipe.metadata.name, recipe.metadata.version));

    let files = select_files(worktree_root, &recipe.package.patterns)?;
    if files.is_empty() && !opts.allow_empty {
        let err = Error::EmptyPackage {
            patterns: recipe.package.patterns.clone(),
            root: worktree_root.to_path_buf(),
        };
        record_failure(db.as_ref(), &identity, &recipe, &err);
        return Err(err);
    }

    let revision = RevisionPin::load(&RevisionPin::path_for(recipe_path))
        .ok()
        .map(|pin| pin.revision);

    match assemble(worktree_root, &files, &package_root, &recipe.package.prefix) {
        Ok(count) => {
            if let Some(db) = &db {
                db.record_packaged(
                    &identity,
                    &recipe.metadata.name,
                    &recipe.metadata.version,
                    revision.as_deref(),
                    &package_root.to_string_lossy(),
                    count as i64,
                )?;
            }
            tracing::info!("Assembled {} file(s) into {:?}", count, package_root);
            Ok(PackageOutcome::Assembled {
                identity,
                path: package_root,
                files: count,
            })
        }
        Err(err) => {
            record_failure(db.as_ref(), &identity, &recipe, &err);
            Err(err)
        }
    }
}

fn record_failure(db: Option<&CacheDatabase>, identity: &str, recipe: &Recipe, err: &Error) {
    if let Some(db) = db {
        if let Err(cache_err) = db.record_failure(
            identity,
            &recipe.metadata.name,
            &recipe.metadata.version,
            &err.to_string(),
        ) {
            tracing::warn!("Failed to record failure in cache: {}", cache_err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command;

    fn git_available() -> bool {
        which::which("git").is_ok()
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .current_dir(dir)
            .args([
                "-c",
                "user.name=pinpack",
                "-c",
                "user.email=pinpack@localhost",
            ])
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    /// Fixture: a committed repository with its own path as `origin`, plus a
    /// schema v2 recipe next to it.
    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        fs::create_dir_all(&repo).unwrap();

        git(&repo, &["init", "-q"]);
        fs::write(repo.join("foo.h"), "#pragma once\n").unwrap();
        fs::create_dir_all(repo.join("sub")).unwrap();
        fs::write(repo.join("sub/bar.h"), "#pragma once\n").unwrap();
        fs::write(repo.join("main.cpp"), "int main(){}\n").unwrap();
        git(&repo, &["add", "-A"]);
        git(&repo, &["commit", "-q", "-m", "init"]);
        git(&repo, &["remote", "add", "origin", &repo.to_string_lossy()]);

        let recipe_path = dir.path().join("fioc.yaml");
        fs::write(
            &recipe_path,
            "schema: 2\nname: fioc\nversion: 1.0.0\nlicense: free to use\n\
             description: Lightweight C++ IoC implementation\npackage: [\"*.h\"]\n",
        )
        .unwrap();

        (dir, recipe_path)
    }

    #[test]
    fn test_full_pipeline() {
        if !git_available() {
            return;
        }
        let (dir, recipe_path) = fixture();

        let pin = export(&recipe_path, &dir.path().join("repo")).unwrap();
        assert!(RevisionPin::path_for(&recipe_path).exists());
        assert_eq!(pin.revision.len(), 40);

        let tree = fetch_source(&recipe_path, None).unwrap();
        assert!(tree.root().join("foo.h").exists());

        let opts = PackageOptions {
            outdir: dir.path().join("out"),
            profile: BuildProfile::default(),
            force: false,
            allow_empty: false,
            cache: None,
        };
        let outcome = package(&recipe_path, tree.root(), &opts).unwrap();

        let root = outcome.path();
        assert!(root.join("include/foo.h").exists());
        assert!(root.join("include/sub/bar.h").exists());
        assert!(!root.join("include/main.cpp").exists());
        match outcome {
            PackageOutcome::Assembled { files, .. } => assert_eq!(files, 2),
            other => panic!("expected assembly, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_without_pin_fails() {
        if !git_available() {
            return;
        }
        let (_dir, recipe_path) = fixture();
        let err = fetch_source(&recipe_path, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Recipe(pinpack_recipe::Error::PinNotFound(_))
        ));
    }

    #[test]
    fn test_second_package_run_reuses_cache() {
        if !git_available() {
            return;
        }
        let (dir, recipe_path) = fixture();

        export(&recipe_path, &dir.path().join("repo")).unwrap();
        let tree = fetch_source(&recipe_path, None).unwrap();

        let opts = PackageOptions {
            outdir: dir.path().join("out"),
            profile: BuildProfile::default(),
            force: false,
            allow_empty: false,
            cache: Some(dir.path().join("cache.sdb")),
        };

        let first = package(&recipe_path, tree.root(), &opts).unwrap();
        assert!(matches!(first, PackageOutcome::Assembled { .. }));

        let second = package(&recipe_path, tree.root(), &opts).unwrap();
        assert!(matches!(second, PackageOutcome::Reused { .. }));
        assert_eq!(first.identity(), second.identity());

        let forced = PackageOptions {
            force: true,
            outdir: opts.outdir.clone(),
            profile: BuildProfile::default(),
            allow_empty: false,
            cache: opts.cache.clone(),
        };
        let third = package(&recipe_path, tree.root(), &forced).unwrap();
        assert!(matches!(third, PackageOutcome::Assembled { .. }));
    }

    #[test]
    fn test_empty_fileset_is_fatal_by_default() {
        if !git_available() {
            return;
        }
        let (dir, recipe_path) = fixture();
        fs::write(
            &recipe_path,
            "schema: 2\nname: fioc\nversion: 1.0.0\nlicense: MIT\npackage: [\"*.hpp\"]\n",
        )
        .unwrap();

        export(&recipe_path, &dir.path().join("repo")).unwrap();
        let tree = fetch_source(&recipe_path, None).unwrap();

        let opts = PackageOptions {
            outdir: dir.path().join("out"),
            profile: BuildProfile::default(),
            force: false,
            allow_empty: false,
            cache: None,
        };
        let err = package(&recipe_path, tree.root(), &opts).unwrap_err();
        assert!(matches!(err, Error::EmptyPackage { .. }));

        let relaxed = PackageOptions {
            allow_empty: true,
            outdir: dir.path().join("out"),
            profile: BuildProfile::default(),
            force: false,
            cache: None,
        };
        let outcome = package(&recipe_path, tree.root(), &relaxed).unwrap();
        assert!(matches!(outcome, PackageOutcome::Assembled { files: 0, .. }));
    }

    #[test]
    fn test_header_only_identity_ignores_profile() {
        if !git_available() {
            return;
        }
        let (dir, recipe_path) = fixture();
        export(&recipe_path, &dir.path().join("repo")).unwrap();
        let tree = fetch_source(&recipe_path, None).unwrap();

        let gcc = PackageOptions {
            outdir: dir.path().join("out"),
            profile: BuildProfile {
                compiler: Some("gcc".into()),
                platform: Some("linux".into()),
                build_type: Some("Release".into()),
            },
            force: false,
            allow_empty: false,
            cache: Some(dir.path().join("cache.sdb")),
        };
        let first = package(&recipe_path, tree.root(), &gcc).unwrap();

        let msvc = PackageOptions {
            outdir: dir.path().join("out"),
            profile: BuildProfile {
                compiler: Some("msvc".into()),
                platform: Some("windows".into()),
                build_type: Some("Debug".into()),
            },
            force: false,
            allow_empty: false,
            cache: Some(dir.path().join("cache.sdb")),
        };
        let second = package(&recipe_path, tree.root(), &msvc).unwrap();

        assert_eq!(first.identity(), second.identity());
        assert!(matches!(second, PackageOutcome::Reused { .. }));
    }
}
