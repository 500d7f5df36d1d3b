//! Imports a directory on disk into a [VirtualFileSystem].

use std::fs;
use std::path::Path;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use stage_vfs::path::PathBuf;
use stage_vfs::VirtualFileSystem;

use crate::Error;

/// Copies the tree below `dir` into `vfs`, returning the number of files
/// imported. Entries are imported in file name order, symlinks are
/// followed.
#[instrument(skip(vfs), fields(dir = %dir.display()), err)]
pub fn import_dir(vfs: &VirtualFileSystem, dir: &Path) -> Result<usize, Error> {
    let mut files = 0;
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .expect("walkdir entries are below the root");
        let import_err = |source| Error::Import {
            path: entry.path().to_owned(),
            source,
        };
        let name = PathBuf::from_host_path(relative)
            .map_err(import_err)?
            .to_string();

        if entry.file_type().is_dir() {
            vfs.create_dir(&name).map_err(import_err)?;
        } else {
            let content = fs::read(entry.path()).map_err(|source| Error::Io {
                path: entry.path().to_owned(),
                source,
            })?;
            vfs.create_file(&name, content).map_err(import_err)?;
            debug!(path = %name, "imported file");
            files += 1;
        }
    }
    Ok(files)
}
