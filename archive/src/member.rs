use bstr::ByteSlice;
use bytes::Bytes;
use std::fmt;
use stage_vfs::path::{PathBuf, PathComponent};

/// A file or directory stored inside an archive.
#[derive(Clone, PartialEq, Eq)]
pub enum Member {
    File {
        name: PathComponent,
        content: Bytes,
    },
    Directory {
        name: PathComponent,
        children: Vec<Member>,
    },
}

impl Member {
    pub fn file(name: PathComponent, content: impl Into<Bytes>) -> Self {
        Member::File {
            name,
            content: content.into(),
        }
    }

    pub fn directory(name: PathComponent, children: Vec<Member>) -> Self {
        Member::Directory { name, children }
    }

    pub fn name(&self) -> &PathComponent {
        match self {
            Member::File { name, .. } | Member::Directory { name, .. } => name,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Member::Directory { .. })
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::File { name, content } => f
                .debug_struct("File")
                .field("name", name)
                .field("content", &content.as_bstr())
                .finish(),
            Member::Directory { name, children } => f
                .debug_struct("Directory")
                .field("name", name)
                .field("children", children)
                .finish(),
        }
    }
}

/// Walks a member tree depth-first, yielding every member with its path
/// relative to the archive root, parents before their children.
pub fn walk(members: &[Member]) -> Vec<(PathBuf, &Member)> {
    let mut out = vec![];
    let mut stack: Vec<(PathBuf, &Member)> = members
        .iter()
        .rev()
        .map(|m| (PathBuf::from(m.name().clone()), m))
        .collect();

    while let Some((path, member)) = stack.pop() {
        if let Member::Directory { children, .. } = member {
            for child in children.iter().rev() {
                stack.push((path.join(child.name()), child));
            }
        }
        out.push((path, member));
    }
    out
}

/// Renders a member tree as an indented listing, one member per line.
/// Directories end with a slash, files show their size.
pub fn listing(members: &[Member]) -> String {
    let mut out = String::new();
    for (path, member) in walk(members) {
        let depth = path.components_bytes().count() - 1;
        let indent = "  ".repeat(depth);
        match member {
            Member::File { name, content } => {
                out.push_str(&format!("{indent}{name} ({} bytes)\n", content.len()))
            }
            Member::Directory { name, .. } => out.push_str(&format!("{indent}{name}/\n")),
        }
    }
    out
}
