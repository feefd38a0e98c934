//! pinpack CLI
//!
//! Drives the packaging pipeline for pinned header-only sources, one
//! subcommand per phase: export captures the revision pin, fetch reproduces
//! the pinned tree, package copies the selected files into the target
//! layout. `build` chains fetch and package against an existing pin.

use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod assemble;
mod error;
mod git;
mod pipeline;
mod select;

use error::Result;
use pinpack_recipe::{compute_identity, BuildProfile, Recipe};
use pipeline::{PackageOptions, PackageOutcome};

static CHECK_MARK: LazyLock<colored::ColoredString> = LazyLock::new(|| "✔".bright_green().bold());

#[derive(Parser)]
#[command(name = "pinpack")]
#[command(about = "Pin, fetch and package header-only library sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProfileArgs {
    /// Consumer compiler (ignored for header-only recipes)
    #[arg(long)]
    compiler: Option<String>,

    /// Consumer platform (ignored for header-only recipes)
    #[arg(long)]
    platform: Option<String>,

    /// Consumer build type (ignored for header-only recipes)
    #[arg(long)]
    build_type: Option<String>,
}

impl From<ProfileArgs> for BuildProfile {
    fn from(args: ProfileArgs) -> Self {
        BuildProfile {
            compiler: args.compiler,
            platform: args.platform,
            build_type: args.build_type,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the revision pin from a live working copy
    Export {
        /// Path to the recipe manifest
        #[arg(short, long)]
        recipe: PathBuf,

        /// Working copy to resolve (defaults to the current directory)
        #[arg(short, long, default_value = ".")]
        workdir: PathBuf,
    },

    /// Reproduce the pinned source tree
    Fetch {
        /// Path to the recipe manifest
        #[arg(short, long)]
        recipe: PathBuf,

        /// Empty directory to clone into (a temp directory if omitted)
        #[arg(short, long)]
        target: Option<PathBuf>,
    },

    /// Copy selected files from a fetched tree into the package layout
    Package {
        /// Path to the recipe manifest
        #[arg(short, long)]
        recipe: PathBuf,

        /// Fetched working tree to package from
        #[arg(short, long)]
        worktree: PathBuf,

        /// Directory to place the package under
        #[arg(short, long)]
        outdir: PathBuf,

        /// Repackage even when the cache holds this identity
        #[arg(short, long)]
        force: bool,

        /// Treat an empty file selection as success
        #[arg(long)]
        allow_empty: bool,

        /// Reuse cache database (no caching if omitted)
        #[arg(long)]
        cache: Option<PathBuf>,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Fetch and package in one run against an existing pin
    Build {
        /// Path to the recipe manifest
        #[arg(short, long)]
        recipe: PathBuf,

        /// Directory to place the package under
        #[arg(short, long)]
        outdir: PathBuf,

        /// Keep the temp working tree instead of reclaiming it
        #[arg(short, long)]
        keep: bool,

        /// Repackage even when the cache holds this identity
        #[arg(short, long)]
        force: bool,

        /// Treat an empty file selection as success
        #[arg(long)]
        allow_empty: bool,

        /// Reuse cache database (no caching if omitted)
        #[arg(long)]
        cache: Option<PathBuf>,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Print the package identity for a recipe
    Identity {
        /// Path to the recipe manifest
        #[arg(short, long)]
        recipe: PathBuf,

        #[command(flatten)]
        profile: ProfileArgs,
    },
}

fn setup_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match cli.command {
        Commands::Export { recipe, workdir } => {
            git::ensure_git()?;
            let pin = pipeline::export(&recipe, &workdir)?;
            println!(
                "[{}] Pinned {} @ {}",
                &*CHECK_MARK, pin.url, pin.revision
            );
            Ok(())
        }

        Commands::Fetch { recipe, target } => {
            git::ensure_git()?;
            let tree = pipeline::fetch_source(&recipe, target)?;
            // The fetched tree is this command's product; always keep it.
            let root = tree.keep();
            println!("[{}] Fetched source tree at {}", &*CHECK_MARK, root.display());
            Ok(())
        }

        Commands::Package {
            recipe,
            worktree,
            outdir,
            force,
            allow_empty,
            cache,
            profile,
        } => {
            let opts = PackageOptions {
                outdir,
                profile: profile.into(),
                force,
                allow_empty,
                cache,
            };
            let outcome = pipeline::package(&recipe, &worktree, &opts)?;
            report_outcome(&outcome);
            Ok(())
        }

        Commands::Build {
            recipe,
            outdir,
            keep,
            force,
            allow_empty,
            cache,
            profile,
        } => {
            git::ensure_git()?;
            let tree = pipeline::fetch_source(&recipe, None)?;
            let opts = PackageOptions {
                outdir,
                profile: profile.into(),
                force,
                allow_empty,
                cache,
            };
            let outcome = pipeline::package(&recipe, tree.root(), &opts)?;
            report_outcome(&outcome);
            if keep {
                let root = tree.keep();
                println!("[{}] Kept working tree at {}", &*CHECK_MARK, root.display());
            }
            Ok(())
        }

        Commands::Identity { recipe, profile } => {
            let recipe = Recipe::from_file(&recipe)?;
            let identity =
                compute_identity(&recipe.metadata, recipe.header_only, &profile.into());
            println!("{}", identity);
            Ok(())
        }
    }
}

fn report_outcome(outcome: &PackageOutcome) {
    match outcome {
        PackageOutcome::Reused { identity, path } => {
            println!(
                "[{}] Reused package {} ({})",
                &*CHECK_MARK,
                path.display(),
                &identity[..12.min(identity.len())]
            );
        }
        PackageOutcome::Assembled {
            identity,
            path,
            files,
        } => {
            println!(
                "[{}] Packaged {} file(s) into {} ({})",
                &*CHECK_MARK,
                files,
                path.display(),
                &identity[..12.min(identity.len())]
            );
        }
    }
}
