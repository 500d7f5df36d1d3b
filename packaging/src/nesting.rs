//! Navigation shared by the plan and expected-tree builders: `dir` and
//! `archive` descend into a (found or created) container, `end` goes back up.

use stage_vfs::path::PathComponent;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContainerKind {
    Directory,
    Archive,
}

/// A tree node that may be a named directory or archive.
pub(crate) trait Nested: Sized {
    fn container(kind: ContainerKind, name: PathComponent, children: Vec<Self>) -> Self;

    fn as_container(&self) -> Option<(ContainerKind, &PathComponent)>;

    /// Children of a container, consuming it. Only called on nodes for
    /// which [Nested::as_container] returned something.
    fn into_children(self) -> Vec<Self>;
}

#[derive(Debug)]
struct Frame<N> {
    container: Option<(ContainerKind, PathComponent)>,
    /// Position in the parent, if the container existed before.
    index: Option<usize>,
    children: Vec<N>,
}

/// A stack of open containers, rooted at an unnamed root.
#[derive(Debug)]
pub(crate) struct Nesting<N> {
    frames: Vec<Frame<N>>,
    /// First error hit while building, reported on [Nesting::finish].
    error: Option<Error>,
}

impl<N: Nested> Nesting<N> {
    pub(crate) fn new() -> Self {
        Self {
            frames: vec![Frame {
                container: None,
                index: None,
                children: vec![],
            }],
            error: None,
        }
    }

    pub(crate) fn fail(&mut self, msg: String) {
        if self.error.is_none() {
            self.error = Some(Error::InvalidPlan(msg));
        }
    }

    fn current(&mut self) -> &mut Frame<N> {
        // there's always the root frame
        self.frames.last_mut().expect("root frame")
    }

    pub(crate) fn push(&mut self, node: N) {
        self.current().children.push(node)
    }

    /// Descends into the container of `kind` named `name`, creating it if
    /// the current container doesn't have it yet.
    pub(crate) fn open(&mut self, kind: ContainerKind, name: &str) {
        let name = match PathComponent::try_from(name) {
            Ok(name) => name,
            Err(e) => {
                self.fail(format!("invalid name {name:?}: {e}"));
                return;
            }
        };

        let current = self.current();
        let existing = current
            .children
            .iter()
            .position(|c| c.as_container() == Some((kind, &name)));

        let frame = match existing {
            Some(index) => Frame {
                container: Some((kind, name)),
                index: Some(index),
                children: current.children.remove(index).into_children(),
            },
            None => Frame {
                container: Some((kind, name)),
                index: None,
                children: vec![],
            },
        };
        self.frames.push(frame);
    }

    /// Goes back to the parent container.
    pub(crate) fn close(&mut self) {
        if self.frames.len() == 1 {
            self.fail("end() without matching dir() or archive()".into());
            return;
        }
        self.close_frame();
    }

    fn close_frame(&mut self) {
        let Some(Frame {
            container: Some((kind, name)),
            index,
            children,
        }) = self.frames.pop()
        else {
            return;
        };

        let node = N::container(kind, name, children);
        let parent = self.current();
        match index {
            Some(index) => parent.children.insert(index, node),
            None => parent.children.push(node),
        }
    }

    /// Closes all open containers, returning the children of the root.
    pub(crate) fn finish(mut self) -> Result<Vec<N>, Error> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        while self.frames.len() > 1 {
            self.close_frame();
        }
        Ok(self.frames.pop().map(|f| f.children).unwrap_or_default())
    }
}
