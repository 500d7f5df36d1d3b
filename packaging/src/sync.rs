//! Writes artifact output to disk.

use rustc_hash::FxHashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

use crate::output::OutputEntry;
use crate::Error;

/// Syncs `entries` into `dir`, returning the number of files written.
///
/// Entries whose digest equals the one in `previous` (the output last
/// synced to `dir`) are not rewritten, as long as they still exist on disk.
/// Anything in `dir` that isn't part of `entries` is removed.
#[instrument(skip(entries, previous), fields(dir = %dir.display()), err)]
pub(crate) fn sync_dir(
    dir: &Path,
    entries: &[OutputEntry],
    previous: Option<&[OutputEntry]>,
) -> Result<usize, Error> {
    fs::create_dir_all(dir).map_err(Error::io(dir))?;

    let previous: FxHashMap<_, _> = previous
        .unwrap_or_default()
        .iter()
        .map(|e| (e.name(), e))
        .collect();

    let mut written = 0;
    for entry in entries {
        let path = dir.join(entry.name().to_string_lossy());
        let prev = previous.get(entry.name()).copied();

        match entry {
            OutputEntry::Directory { children, .. } => {
                if path.is_file() {
                    fs::remove_file(&path).map_err(Error::io(&path))?;
                }
                let prev_children = match prev {
                    Some(OutputEntry::Directory { children, .. }) => Some(&children[..]),
                    _ => None,
                };
                written += sync_dir(&path, children, prev_children)?;
            }
            OutputEntry::File { .. } | OutputEntry::Archive { .. } => {
                let unchanged = prev.is_some_and(|p| {
                    p.bytes().is_some() && p.digest() == entry.digest()
                }) && path.is_file();
                if unchanged {
                    continue;
                }
                if path.is_dir() {
                    fs::remove_dir_all(&path).map_err(Error::io(&path))?;
                }
                let content = entry.bytes().map(|b| &b[..]).unwrap_or_default();
                fs::write(&path, content).map_err(Error::io(&path))?;
                debug!(path = %path.display(), "wrote file");
                written += 1;
            }
        }
    }

    // remove leftovers
    let wanted: Vec<String> = entries
        .iter()
        .map(|e| e.name().to_string_lossy())
        .collect();
    for dirent in fs::read_dir(dir).map_err(Error::io(dir))? {
        let dirent = dirent.map_err(Error::io(dir))?;
        let name = dirent.file_name().to_string_lossy().into_owned();
        if wanted.contains(&name) {
            continue;
        }
        let path = dirent.path();
        debug!(path = %path.display(), "removing stale entry");
        if dirent.file_type().map_err(Error::io(&path))?.is_dir() {
            fs::remove_dir_all(&path).map_err(Error::io(&path))?;
        } else {
            fs::remove_file(&path).map_err(Error::io(&path))?;
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::sync_dir;
    use crate::output::OutputEntry;
    use std::fs;

    fn entries(content: &'static str) -> Vec<OutputEntry> {
        vec![
            OutputEntry::directory(
                "d".try_into().unwrap(),
                vec![OutputEntry::file("a.txt".try_into().unwrap(), content.into(), 1)],
            ),
            OutputEntry::archive("x.zip".try_into().unwrap(), vec![], "zip".into()),
        ]
    }

    #[test]
    fn writes_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let written = sync_dir(tmp.path(), &entries("a"), None).unwrap();
        assert_eq!(2, written);
        assert_eq!("a", fs::read_to_string(tmp.path().join("d/a.txt")).unwrap());
        assert_eq!("zip", fs::read_to_string(tmp.path().join("x.zip")).unwrap());
    }

    #[test]
    fn skips_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let first = entries("a");
        sync_dir(tmp.path(), &first, None).unwrap();

        let second = entries("b");
        assert_eq!(1, sync_dir(tmp.path(), &second, Some(&first)).unwrap());
        assert_eq!("b", fs::read_to_string(tmp.path().join("d/a.txt")).unwrap());

        assert_eq!(0, sync_dir(tmp.path(), &second, Some(&second)).unwrap());
    }

    #[test]
    fn removes_stale() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("stale.txt"), "x").unwrap();
        fs::create_dir_all(tmp.path().join("stale/dir")).unwrap();

        sync_dir(tmp.path(), &entries("a"), None).unwrap();

        let mut names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(vec!["d", "x.zip"], names);
    }
}
