use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stage_archive::Compression;
use tracing::Level;

/// Stages build artifacts: directories and archives assembled from a
/// source tree, as declared in a manifest.
#[derive(Parser, Clone, Debug)]
pub struct Args {
    /// A global log level to use when printing logs.
    /// It's also possible to set `RUST_LOG` according to
    /// `tracing_subscriber::filter::EnvFilter`, which will always have
    /// priority.
    #[arg(long, default_value_t=Level::INFO)]
    pub log_level: Level,

    /// Print logs as JSON lines.
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Builds all artifacts of a manifest.
    Build {
        /// Path to the JSON manifest declaring the artifacts.
        #[arg(long)]
        manifest: PathBuf,

        /// Directory the source paths in the manifest are relative to.
        #[arg(long)]
        source: PathBuf,

        /// Directory to write the artifacts to, one subdirectory each.
        #[arg(long, env = "STAGE_OUTPUT_DIR")]
        out: PathBuf,

        /// Archive compression, overriding the manifest.
        /// One of `none`, `zstd` or `zstd:<level>`.
        #[arg(long, env = "STAGE_COMPRESSION")]
        compression: Option<Compression>,
    },

    /// Lists the members of an archive.
    Ls {
        /// Path to the archive.
        archive: PathBuf,
    },
}
