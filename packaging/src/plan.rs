//! Packaging plans: declarative descriptions of an artifact's output layout.
//!
//! Plans are built with a fluent builder, mirroring the resulting layout:
//!
//! ```rust
//! # use stage_vfs::{NoopEventSink, VirtualFileSystem};
//! # let fs = VirtualFileSystem::new(NoopEventSink);
//! # let file = fs.create_file("a.txt", "text").unwrap();
//! let plan = stage_packaging::plan::root()
//!     .dir("dir")
//!     .archive("x.zip")
//!     .file(&file)
//!     .build()?;
//! # Ok::<(), stage_packaging::Error>(())
//! ```
//!
//! Building a plan does no I/O, and references to other artifacts are only
//! resolved when packaging.

use stage_vfs::path::PathComponent;
use stage_vfs::SourceNode;

use crate::nesting::{ContainerKind, Nested, Nesting};
use crate::Error;

/// One element of a packaging plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    /// Copies a source file, keeping its name.
    File(SourceNode),
    Directory {
        name: PathComponent,
        children: Vec<PlanNode>,
    },
    /// An archive, serialized from its children.
    Archive {
        name: PathComponent,
        children: Vec<PlanNode>,
    },
    /// Includes the output of the named artifact.
    ArtifactRef(String),
    /// Copies the children of a source directory, recursively.
    DirCopy(SourceNode),
}

impl Nested for PlanNode {
    fn container(kind: ContainerKind, name: PathComponent, children: Vec<Self>) -> Self {
        match kind {
            ContainerKind::Directory => PlanNode::Directory { name, children },
            ContainerKind::Archive => PlanNode::Archive { name, children },
        }
    }

    fn as_container(&self) -> Option<(ContainerKind, &PathComponent)> {
        match self {
            PlanNode::Directory { name, .. } => Some((ContainerKind::Directory, name)),
            PlanNode::Archive { name, .. } => Some((ContainerKind::Archive, name)),
            _ => None,
        }
    }

    fn into_children(self) -> Vec<Self> {
        match self {
            PlanNode::Directory { children, .. } | PlanNode::Archive { children, .. } => children,
            _ => vec![],
        }
    }
}

/// The plan of an artifact: the children of its (unnamed) output root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    root: Vec<PlanNode>,
}

impl Plan {
    pub fn new(root: Vec<PlanNode>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &[PlanNode] {
        &self.root
    }
}

/// Starts a plan at the artifact's output root.
pub fn root() -> PlanBuilder {
    PlanBuilder {
        nesting: Nesting::new(),
    }
}

/// Starts a plan whose only top-level entry is the archive `name`, and
/// descends into it.
pub fn archive_root(name: &str) -> PlanBuilder {
    root().archive(name)
}

#[derive(Debug)]
pub struct PlanBuilder {
    nesting: Nesting<PlanNode>,
}

impl PlanBuilder {
    /// Adds a copy of `source` to the current container.
    pub fn file(mut self, source: &SourceNode) -> Self {
        self.nesting.push(PlanNode::File(source.clone()));
        self
    }

    /// Descends into the directory `name`, creating it if needed.
    pub fn dir(mut self, name: &str) -> Self {
        self.nesting.open(ContainerKind::Directory, name);
        self
    }

    /// Descends into the archive `name`, creating it if needed.
    pub fn archive(mut self, name: &str) -> Self {
        self.nesting.open(ContainerKind::Archive, name);
        self
    }

    /// Includes the output of artifact `name` into the current container.
    pub fn artifact(mut self, name: &str) -> Self {
        self.nesting.push(PlanNode::ArtifactRef(name.to_owned()));
        self
    }

    /// Copies the children of the source directory into the current container.
    pub fn dir_copy(mut self, source: &SourceNode) -> Self {
        self.nesting.push(PlanNode::DirCopy(source.clone()));
        self
    }

    /// Goes back up to the parent container.
    pub fn end(mut self) -> Self {
        self.nesting.close();
        self
    }

    pub fn build(self) -> Result<Plan, Error> {
        Ok(Plan::new(self.nesting.finish()?))
    }
}
