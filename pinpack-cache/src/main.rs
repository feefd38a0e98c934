//! pinpack-cache CLI
//!
//! Command-line interface for inspecting and managing the reuse cache.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use pinpack_cache::{CacheDatabase, PackageStatus, Result};

#[derive(Parser)]
#[command(name = "pinpack-cache")]
#[command(about = "Reuse cache management for pinpack packages", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to cache database
    #[arg(short, long, default_value = "pinpack_cache.sdb")]
    cache: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum StatusFilter {
    Packaged,
    Failed,
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new cache database
    Init,

    /// Show statistics over cached identities
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List cached packages with optional filtering
    List {
        /// Filter by status
        #[arg(short, long, value_enum, default_value = "all")]
        status: StatusFilter,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Limit number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the record for one identity
    Show {
        /// Package identity (hex digest)
        identity: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a cached identity
    Remove {
        /// Package identity (hex digest)
        identity: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let db = CacheDatabase::open(&cli.cache)?;
            println!("Initialized cache database at {:?}", cli.cache);
            let stats = db.get_stats()?;
            println!("Total identities: {}", stats.total_identities);
            Ok(())
        }

        Commands::Stats { json } => {
            let db = CacheDatabase::open(&cli.cache)?;
            let stats = db.get_stats()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Cache Statistics");
                println!("================");
                println!("Total identities: {}", stats.total_identities);
                println!("Packaged:         {}", stats.packaged);
                println!("Failed:           {}", stats.failed);
            }
            Ok(())
        }

        Commands::List {
            status,
            json,
            limit,
        } => {
            let db = CacheDatabase::open(&cli.cache)?;
            let filter = match status {
                StatusFilter::Packaged => Some(PackageStatus::Packaged),
                StatusFilter::Failed => Some(PackageStatus::Failed),
                StatusFilter::All => None,
            };

            let mut packages = db.list_packages(filter)?;
            if let Some(limit) = limit {
                packages.truncate(limit);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&packages)?);
            } else {
                for pkg in &packages {
                    let path = pkg.package_path.as_deref().unwrap_or("-");
                    println!(
                        "{}  {} v{}  [{}]  {}",
                        &pkg.identity[..12.min(pkg.identity.len())],
                        pkg.name,
                        pkg.version,
                        pkg.status,
                        path
                    );
                }
                println!();
                println!("{} package(s)", packages.len());
            }
            Ok(())
        }

        Commands::Show { identity, json } => {
            let db = CacheDatabase::open(&cli.cache)?;
            let record = db
                .get_by_identity(&identity)?
                .ok_or(pinpack_cache::Error::PackageNotFound(identity))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("Identity:  {}", record.identity);
                println!("Package:   {} v{}", record.name, record.version);
                println!("Status:    {}", record.status);
                if let Some(ref revision) = record.revision {
                    println!("Revision:  {}", revision);
                }
                if let Some(ref path) = record.package_path {
                    println!("Path:      {}", path);
                }
                if let Some(count) = record.file_count {
                    println!("Files:     {}", count);
                }
                if let Some(ref err) = record.error_message {
                    println!("Error:     {}", err);
                }
                println!("Updated:   {}", record.updated_at.to_rfc3339());
            }
            Ok(())
        }

        Commands::Remove { identity } => {
            let db = CacheDatabase::open(&cli.cache)?;
            if db.remove(&identity)? {
                println!("Removed {}", identity);
            } else {
                println!("Nothing cached under {}", identity);
            }
            Ok(())
        }
    }
}
