use std::io::Write;
use std::path::Path;

use stage_archive::Compression;
use stage_packaging::{Manifest, PackageReport, Packager};
use stage_vfs::{NoopEventSink, VirtualFileSystem};
use tracing::{info, instrument, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

pub mod args;
mod errors;
pub mod import;

pub use args::{Args, Command};
pub use errors::Error;

/// Builds all artifacts declared in `manifest` from the files below
/// `source`, writing them to `out`.
#[instrument(skip_all, fields(manifest = %manifest.display(), indicatif.pb_show = 1), err)]
pub fn build(
    manifest: &Path,
    source: &Path,
    out: &Path,
    compression: Option<Compression>,
) -> Result<PackageReport, Error> {
    let span = Span::current();
    span.pb_set_style(&stage_tracing::PB_SPINNER_STYLE);
    span.pb_set_message("Importing sources…");

    let manifest = Manifest::load(manifest)?;
    let vfs = VirtualFileSystem::new(NoopEventSink);
    let files = import::import_dir(&vfs, source)?;
    info!(files, "imported sources");

    let registry = manifest.registry(&vfs)?;
    let mut config = manifest.config.clone().with_output_dir(out);
    if let Some(compression) = compression {
        config = config.with_compression(compression);
    }

    span.pb_set_message("Packaging…");
    let mut packager = Packager::new(config);
    Ok(packager.compile_project(&registry)?)
}

/// Writes the member tree of the archive at `path` to `w`.
pub fn ls(path: &Path, w: &mut impl Write) -> Result<(), Error> {
    let io_err = |source| Error::Io {
        path: path.to_owned(),
        source,
    };
    let data = std::fs::read(path).map_err(io_err)?;
    let members = stage_archive::decode(&data).map_err(io_err)?;
    w.write_all(stage_archive::listing(&members).as_bytes())
        .map_err(io_err)
}

/// Runs the command given in `args`, writing its output to `w`.
pub fn run(args: &Args, w: &mut impl Write) -> Result<(), Error> {
    match &args.command {
        Command::Build {
            manifest,
            source,
            out,
            compression,
        } => {
            let report = build(manifest, source, out, *compression)?;
            for name in &report.updated {
                writeln!(w, "{name}: updated").map_err(|source| Error::Io {
                    path: out.join(name),
                    source,
                })?;
            }
            for name in &report.unchanged {
                writeln!(w, "{name}: unchanged").map_err(|source| Error::Io {
                    path: out.join(name),
                    source,
                })?;
            }
            Ok(())
        }
        Command::Ls { archive } => ls(archive, w),
    }
}
