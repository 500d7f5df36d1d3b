//! Expansion of plan containers into output slots.
//!
//! A slot is one named output position. Most plan nodes produce exactly one
//! slot, but an included artifact contributes all of its top-level entries,
//! and a directory copy contributes one slot per child of the source
//! directory.

use rustc_hash::FxHashSet;
use stage_vfs::path::{Path, PathComponent};
use stage_vfs::SourceNode;

use crate::plan::PlanNode;
use crate::registry::ArtifactRegistry;
use crate::Error;

/// The artifacts being included, outermost first.
#[derive(Debug, Clone)]
pub(crate) struct Chain<'a>(Vec<&'a str>);

impl<'a> Chain<'a> {
    pub(crate) fn root(artifact: &'a str) -> Self {
        Self(vec![artifact])
    }

    fn enter(&self, artifact: &'a str) -> Result<Self, Error> {
        let mut chain = self.0.clone();
        let cyclic = chain.contains(&artifact);
        chain.push(artifact);
        if cyclic {
            return Err(Error::ArtifactCycle(
                chain.into_iter().map(str::to_owned).collect(),
            ));
        }
        Ok(Self(chain))
    }
}

/// What a directory or archive slot holds.
#[derive(Debug)]
pub(crate) enum Contents<'a> {
    Plan {
        nodes: &'a [PlanNode],
        chain: Chain<'a>,
    },
    /// The children of a copied source directory.
    Source(SourceNode),
}

#[derive(Debug)]
pub(crate) enum Slot<'a> {
    File {
        name: PathComponent,
        source: SourceNode,
    },
    Directory {
        name: PathComponent,
        contents: Contents<'a>,
    },
    Archive {
        name: PathComponent,
        contents: Contents<'a>,
    },
}

impl Slot<'_> {
    pub(crate) fn name(&self) -> &PathComponent {
        match self {
            Slot::File { name, .. } | Slot::Directory { name, .. } | Slot::Archive { name, .. } => {
                name
            }
        }
    }
}

pub(crate) struct Expander<'a> {
    registry: &'a ArtifactRegistry,
    artifact: &'a str,
}

impl<'a> Expander<'a> {
    pub(crate) fn new(registry: &'a ArtifactRegistry, artifact: &'a str) -> Self {
        Self { registry, artifact }
    }

    pub(crate) fn artifact(&self) -> &'a str {
        self.artifact
    }

    /// Expands `contents` (living at `path`) into its slots, in order.
    pub(crate) fn expand(&self, contents: &Contents<'a>, path: &Path) -> Result<Vec<Slot<'a>>, Error> {
        let mut slots = vec![];
        match contents {
            Contents::Plan { nodes, chain } => {
                for node in nodes.iter() {
                    self.expand_node(node, chain, &mut slots)?;
                }
            }
            Contents::Source(dir) => copy_dir(dir, &mut slots)?,
        }

        let mut names = FxHashSet::default();
        for slot in &slots {
            if !names.insert(slot.name()) {
                return Err(Error::DuplicateEntry {
                    artifact: self.artifact.to_owned(),
                    path: path.join(slot.name()),
                });
            }
        }

        Ok(slots)
    }

    fn expand_node(
        &self,
        node: &'a PlanNode,
        chain: &Chain<'a>,
        slots: &mut Vec<Slot<'a>>,
    ) -> Result<(), Error> {
        match node {
            PlanNode::File(source) => slots.push(Slot::File {
                name: source.name().map_err(Error::unreadable(source))?,
                source: source.clone(),
            }),
            PlanNode::Directory { name, children } => slots.push(Slot::Directory {
                name: name.clone(),
                contents: Contents::Plan {
                    nodes: children,
                    chain: chain.clone(),
                },
            }),
            PlanNode::Archive { name, children } => slots.push(Slot::Archive {
                name: name.clone(),
                contents: Contents::Plan {
                    nodes: children,
                    chain: chain.clone(),
                },
            }),
            PlanNode::ArtifactRef(target) => {
                let (target, chain) = self.enter(target, chain)?;
                for node in target {
                    self.expand_node(node, &chain, slots)?;
                }
            }
            PlanNode::DirCopy(dir) => copy_dir(dir, slots)?,
        }
        Ok(())
    }

    fn enter(
        &self,
        target: &'a str,
        chain: &Chain<'a>,
    ) -> Result<(&'a [PlanNode], Chain<'a>), Error> {
        let artifact = self
            .registry
            .get(target)
            .ok_or_else(|| Error::UnknownArtifact(target.to_owned()))?;
        Ok((artifact.plan().root(), chain.enter(artifact.name())?))
    }

    /// Whether the output of `slot` depends on `changed`.
    pub(crate) fn reaches(&self, slot: &Slot<'a>, changed: &SourceNode) -> Result<bool, Error> {
        match slot {
            Slot::File { source, .. } => Ok(changed.is_ancestor_of(source)),
            Slot::Directory { contents, .. } | Slot::Archive { contents, .. } => match contents {
                Contents::Plan { nodes, chain } => self.any_reaches(nodes, chain, changed),
                Contents::Source(dir) => Ok(dir_reaches(dir, changed)),
            },
        }
    }

    fn any_reaches(
        &self,
        nodes: &'a [PlanNode],
        chain: &Chain<'a>,
        changed: &SourceNode,
    ) -> Result<bool, Error> {
        for node in nodes {
            let reached = match node {
                PlanNode::File(source) => changed.is_ancestor_of(source),
                PlanNode::Directory { children, .. } | PlanNode::Archive { children, .. } => {
                    self.any_reaches(children, chain, changed)?
                }
                PlanNode::ArtifactRef(target) => {
                    let (target, chain) = self.enter(target, chain)?;
                    self.any_reaches(target, &chain, changed)?
                }
                PlanNode::DirCopy(dir) => dir_reaches(dir, changed),
            };
            if reached {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// A copied directory is affected by changes below it, and by changes to
/// any directory containing it.
fn dir_reaches(dir: &SourceNode, changed: &SourceNode) -> bool {
    dir.is_ancestor_of(changed) || changed.is_ancestor_of(dir)
}

fn copy_dir(dir: &SourceNode, slots: &mut Vec<Slot<'_>>) -> Result<(), Error> {
    if !dir.is_valid() {
        return Err(Error::UnreadableSource {
            path: dir.path(),
            reason: "source directory has been deleted".into(),
        });
    }
    if !dir.is_directory() {
        return Err(Error::UnreadableSource {
            path: dir.path(),
            reason: "source is not a directory".into(),
        });
    }

    for child in dir.children() {
        let name = child.name().map_err(Error::unreadable(&child))?;
        slots.push(if child.is_directory() {
            Slot::Directory {
                name,
                contents: Contents::Source(child),
            }
        } else {
            Slot::File {
                name,
                source: child,
            }
        });
    }
    Ok(())
}
