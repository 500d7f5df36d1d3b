use bytes::Bytes;
use stage_archive::Member;
use stage_vfs::path::{Path, PathBuf, PathComponent};

use crate::digest::{B3Digest, DirectoryHasher, EntryKind};

/// A produced output entry, the materialized mirror of a plan slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEntry {
    File {
        name: PathComponent,
        content: Bytes,
        digest: B3Digest,
        /// Modification stamp of the source at the time it was read.
        source_stamp: u64,
    },
    Directory {
        name: PathComponent,
        children: Vec<OutputEntry>,
        digest: B3Digest,
    },
    Archive {
        name: PathComponent,
        /// The output tree the archive was serialized from.
        members: Vec<OutputEntry>,
        /// Serialized (and possibly compressed) archive.
        bytes: Bytes,
        digest: B3Digest,
    },
}

impl OutputEntry {
    pub fn file(name: PathComponent, content: Bytes, source_stamp: u64) -> Self {
        let digest = B3Digest::of(&content);
        OutputEntry::File {
            name,
            content,
            digest,
            source_stamp,
        }
    }

    pub fn directory(name: PathComponent, children: Vec<OutputEntry>) -> Self {
        let digest = directory_digest(&children);
        OutputEntry::Directory {
            name,
            children,
            digest,
        }
    }

    pub fn archive(name: PathComponent, members: Vec<OutputEntry>, bytes: Bytes) -> Self {
        let digest = B3Digest::of(&bytes);
        OutputEntry::Archive {
            name,
            members,
            bytes,
            digest,
        }
    }

    pub fn name(&self) -> &PathComponent {
        match self {
            OutputEntry::File { name, .. }
            | OutputEntry::Directory { name, .. }
            | OutputEntry::Archive { name, .. } => name,
        }
    }

    pub fn digest(&self) -> &B3Digest {
        match self {
            OutputEntry::File { digest, .. }
            | OutputEntry::Directory { digest, .. }
            | OutputEntry::Archive { digest, .. } => digest,
        }
    }

    pub(crate) fn kind(&self) -> EntryKind {
        match self {
            OutputEntry::File { .. } => EntryKind::File,
            OutputEntry::Directory { .. } => EntryKind::Directory,
            OutputEntry::Archive { .. } => EntryKind::Archive,
        }
    }

    /// The bytes this entry is written out as, if it isn't a directory.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            OutputEntry::File { content, .. } => Some(content),
            OutputEntry::Archive { bytes, .. } => Some(bytes),
            OutputEntry::Directory { .. } => None,
        }
    }

    /// Converts into an archive member. Archives become plain files holding
    /// their serialized bytes.
    pub fn to_member(&self) -> Member {
        match self {
            OutputEntry::File { name, content, .. } => Member::file(name.clone(), content.clone()),
            OutputEntry::Archive { name, bytes, .. } => Member::file(name.clone(), bytes.clone()),
            OutputEntry::Directory { name, children, .. } => Member::directory(
                name.clone(),
                children.iter().map(OutputEntry::to_member).collect(),
            ),
        }
    }
}

pub(crate) fn directory_digest(children: &[OutputEntry]) -> B3Digest {
    let mut hasher = DirectoryHasher::new();
    for child in children {
        hasher.child(child.name().as_ref(), child.kind(), child.digest());
    }
    hasher.finalize()
}

/// Looks up the entry at `path`, descending into directories and archives.
pub fn find<'a>(entries: &'a [OutputEntry], path: &Path) -> Option<&'a OutputEntry> {
    let mut entries = entries;
    let mut found = None;
    for component in path.components() {
        let entry = entries.iter().find(|e| e.name() == &component)?;
        entries = match entry {
            OutputEntry::Directory { children, .. } => children,
            OutputEntry::Archive { members, .. } => members,
            OutputEntry::File { .. } => &[],
        };
        found = Some(entry);
    }
    found
}

/// All entries with their paths, parents before children.
pub fn walk(entries: &[OutputEntry]) -> Vec<(PathBuf, &OutputEntry)> {
    let mut out = vec![];
    let mut stack: Vec<(PathBuf, &OutputEntry)> = entries
        .iter()
        .rev()
        .map(|e| (PathBuf::from(e.name().clone()), e))
        .collect();

    while let Some((path, entry)) = stack.pop() {
        let children: &[OutputEntry] = match entry {
            OutputEntry::Directory { children, .. } => children,
            OutputEntry::Archive { members, .. } => members,
            OutputEntry::File { .. } => &[],
        };
        for child in children.iter().rev() {
            stack.push((path.join(child.name()), child));
        }
        out.push((path, entry));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{find, walk, OutputEntry};
    use pretty_assertions::assert_eq;

    fn tree() -> Vec<OutputEntry> {
        vec![OutputEntry::directory(
            "d".try_into().unwrap(),
            vec![
                OutputEntry::archive(
                    "x.zip".try_into().unwrap(),
                    vec![OutputEntry::file("a".try_into().unwrap(), "1".into(), 1)],
                    "archive bytes".into(),
                ),
                OutputEntry::file("b".try_into().unwrap(), "2".into(), 2),
            ],
        )]
    }

    #[test]
    fn find_descends_into_archives() {
        let tree = tree();
        let a = find(&tree, &"d/x.zip/a".parse::<stage_vfs::path::PathBuf>().unwrap()).unwrap();
        assert_eq!(&bytes::Bytes::from("1"), a.bytes().unwrap());
        assert!(find(&tree, &"d/c".parse::<stage_vfs::path::PathBuf>().unwrap()).is_none());
        assert!(find(&tree, &"d/b/c".parse::<stage_vfs::path::PathBuf>().unwrap()).is_none());
    }

    #[test]
    fn walk_order() {
        let tree = tree();
        let paths: Vec<String> = walk(&tree).iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(vec!["d", "d/x.zip", "d/x.zip/a", "d/b"], paths);
    }

    #[test]
    fn directory_digest_tracks_children() {
        let a = tree();
        let mut b = tree();
        if let OutputEntry::Directory { children, .. } = &mut b[0] {
            children[1] = OutputEntry::file("b".try_into().unwrap(), "changed".into(), 3);
        }
        let b = match b.remove(0) {
            OutputEntry::Directory { name, children, .. } => OutputEntry::directory(name, children),
            _ => unreachable!(),
        };
        assert_ne!(a[0].digest(), b.digest());
    }
}
