//! Compares produced output against an expected tree.
//!
//! ```rust,ignore
//! assert_output(
//!     &packager,
//!     "artifact",
//!     fs().archive("x.zip").file("a.txt", "new text").file("b.txt", "text"),
//! );
//! ```
//!
//! Archives are compared by their decoded members, never by their bytes, so
//! the comparison doesn't depend on compression.

use bytes::Bytes;
use pretty_assertions::StrComparison;
use stage_archive::Member;
use stage_vfs::path::{Path, PathBuf, PathComponent};

use crate::nesting::{ContainerKind, Nested, Nesting};
use crate::output::OutputEntry;
use crate::{Error, Packager};

/// One expected output entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    File {
        name: PathComponent,
        content: Bytes,
    },
    Directory {
        name: PathComponent,
        children: Vec<Expected>,
    },
    Archive {
        name: PathComponent,
        children: Vec<Expected>,
    },
}

impl Nested for Expected {
    fn container(kind: ContainerKind, name: PathComponent, children: Vec<Self>) -> Self {
        match kind {
            ContainerKind::Directory => Expected::Directory { name, children },
            ContainerKind::Archive => Expected::Archive { name, children },
        }
    }

    fn as_container(&self) -> Option<(ContainerKind, &PathComponent)> {
        match self {
            Expected::Directory { name, .. } => Some((ContainerKind::Directory, name)),
            Expected::Archive { name, .. } => Some((ContainerKind::Archive, name)),
            Expected::File { .. } => None,
        }
    }

    fn into_children(self) -> Vec<Self> {
        match self {
            Expected::Directory { children, .. } | Expected::Archive { children, .. } => children,
            Expected::File { .. } => vec![],
        }
    }
}

/// Description of the output expected for an artifact.
#[derive(Debug)]
pub struct ExpectedTree {
    nesting: Nesting<Expected>,
}

/// Starts an expected tree at the artifact's output root.
pub fn fs() -> ExpectedTree {
    ExpectedTree {
        nesting: Nesting::new(),
    }
}

impl ExpectedTree {
    /// Expects a file with the given content in the current container.
    pub fn file(mut self, name: &str, content: impl Into<Bytes>) -> Self {
        match PathComponent::try_from(name) {
            Ok(name) => self.nesting.push(Expected::File {
                name,
                content: content.into(),
            }),
            Err(e) => self.nesting.fail(format!("invalid name {name:?}: {e}")),
        }
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.nesting.open(ContainerKind::Directory, name);
        self
    }

    pub fn archive(mut self, name: &str) -> Self {
        self.nesting.open(ContainerKind::Archive, name);
        self
    }

    pub fn end(mut self) -> Self {
        self.nesting.close();
        self
    }

    pub fn build(self) -> Result<Vec<Expected>, Error> {
        self.nesting.finish()
    }
}

/// Checks the output of `artifact` against `expected`.
///
/// Names, kinds and order of entries must match, file contents must match
/// exactly. The error names the first differing path.
pub fn verify_output(
    packager: &Packager,
    artifact: &str,
    expected: ExpectedTree,
) -> Result<(), Error> {
    let expected = expected.build()?;
    let actual = packager
        .output(artifact)
        .ok_or_else(|| Error::StructuralMismatch {
            path: artifact.to_owned(),
            detail: "artifact has not been built".into(),
        })?;
    let actual: Vec<Member> = actual.iter().map(OutputEntry::to_member).collect();

    compare(Path::ROOT, &expected, &actual).map_err(|(path, detail)| Error::StructuralMismatch {
        path: format!("{artifact}/{path}"),
        detail,
    })
}

/// Like [verify_output], but panics on mismatch.
#[track_caller]
pub fn assert_output(packager: &Packager, artifact: &str, expected: ExpectedTree) {
    if let Err(e) = verify_output(packager, artifact, expected) {
        panic!("{e}")
    }
}

type Mismatch = (PathBuf, String);

fn compare(path: &Path, expected: &[Expected], actual: &[Member]) -> Result<(), Mismatch> {
    let exp_names: Vec<_> = expected.iter().map(Expected::name).collect();
    let act_names: Vec<_> = actual.iter().map(Member::name).collect();
    if exp_names != act_names {
        // report the first differing position
        let at = exp_names
            .iter()
            .zip(&act_names)
            .position(|(e, a)| e != a)
            .unwrap_or(exp_names.len().min(act_names.len()));
        let name = exp_names.get(at).or(act_names.get(at)).copied();
        let path = name.map(|n| path.join(n)).unwrap_or_else(|| path.to_owned());
        return Err((path, diff(&render_expected(expected), &render_actual(actual))));
    }

    for (exp, act) in expected.iter().zip(actual) {
        let path = path.join(exp.name());
        match (exp, act) {
            (Expected::File { content, .. }, Member::File { content: actual, .. }) => {
                if content != actual {
                    return Err((path, diff(&lossy(content), &lossy(actual))));
                }
            }
            (
                Expected::Directory { children, .. },
                Member::Directory {
                    children: actual, ..
                },
            ) => compare(&path, children, actual)?,
            (Expected::Archive { children, .. }, Member::File { content, .. }) => {
                let members = stage_archive::decode(content)
                    .map_err(|e| (path.clone(), format!("not a valid archive: {e}")))?;
                compare(&path, children, &members)?
            }
            (exp, act) => {
                return Err((
                    path,
                    format!("expected {}, found {}", exp.kind(), member_kind(act)),
                ))
            }
        }
    }
    Ok(())
}

impl Expected {
    pub fn name(&self) -> &PathComponent {
        match self {
            Expected::File { name, .. }
            | Expected::Directory { name, .. }
            | Expected::Archive { name, .. } => name,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Expected::File { .. } => "a file",
            Expected::Directory { .. } => "a directory",
            Expected::Archive { .. } => "an archive",
        }
    }
}

fn member_kind(member: &Member) -> &'static str {
    if member.is_directory() {
        "a directory"
    } else {
        "a file"
    }
}

fn lossy(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}

fn diff(expected: &str, actual: &str) -> String {
    format!(
        "Diff < expected / actual > :\n{}",
        StrComparison::new(expected, actual)
    )
}

fn render_expected(entries: &[Expected]) -> String {
    let mut out = String::new();
    for e in entries {
        match e {
            Expected::File { name, .. } => out.push_str(&format!("{name}\n")),
            Expected::Directory { name, .. } => out.push_str(&format!("{name}/\n")),
            Expected::Archive { name, .. } => out.push_str(&format!("{name} (archive)\n")),
        }
    }
    out
}

fn render_actual(members: &[Member]) -> String {
    let mut out = String::new();
    for m in members {
        match m {
            Member::File { name, .. } => out.push_str(&format!("{name}\n")),
            Member::Directory { name, .. } => out.push_str(&format!("{name}/\n")),
        }
    }
    out
}
