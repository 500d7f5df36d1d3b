use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::events::{EventSink, VirtualFileEvent};
use crate::path::{Path, PathBuf, PathComponent};
use crate::{Error, SourceNode};

/// Stable identity of a node, surviving renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out modification stamps.
/// Stamps are strictly increasing within one [VirtualFileSystem].
#[derive(Debug)]
pub(crate) struct StampCounter {
    last: AtomicU64,
}

impl StampCounter {
    fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    pub(crate) fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Makes sure stamps handed out later are bigger than `stamp`.
    pub(crate) fn observe(&self, stamp: u64) {
        self.last.fetch_max(stamp, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    File { content: Bytes },
    Directory { children: Vec<NodeId> },
}

#[derive(Debug)]
pub(crate) struct NodeData {
    /// None only for the root directory.
    pub(crate) name: Option<PathComponent>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) stamp: u64,
    pub(crate) writable: bool,
    pub(crate) valid: bool,
}

#[derive(Debug)]
pub(crate) struct Tree {
    nodes: HashMap<NodeId, NodeData>,
    next_id: u64,
}

pub(crate) const ROOT_ID: NodeId = NodeId(0);

impl Tree {
    fn new(root_stamp: u64) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_ID,
            NodeData {
                name: None,
                parent: None,
                kind: NodeKind::Directory { children: vec![] },
                stamp: root_stamp,
                writable: true,
                valid: true,
            },
        );
        Self { nodes, next_id: 1 }
    }

    pub(crate) fn get(&self, id: NodeId) -> &NodeData {
        self.nodes
            .get(&id)
            .expect("stage-vfs bug: node ids are never removed")
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.nodes
            .get_mut(&id)
            .expect("stage-vfs bug: node ids are never removed")
    }

    pub(crate) fn path_of(&self, id: NodeId) -> PathBuf {
        let mut names = vec![];
        let mut cur = Some(id);
        while let Some(id) = cur {
            let data = self.get(id);
            if let Some(name) = &data.name {
                names.push(name);
            }
            cur = data.parent;
        }

        let mut path = PathBuf::new();
        for name in names.into_iter().rev() {
            path.push(name);
        }
        path
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.get(id).kind {
            NodeKind::Directory { children } => children,
            NodeKind::File { .. } => &[],
        }
    }

    pub(crate) fn child_named(&self, id: NodeId, name: &[u8]) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.get(*c).name.as_ref().map(|n| n.as_ref()) == Some(name))
    }

    fn lookup(&self, path: &Path) -> Option<NodeId> {
        let mut cur = ROOT_ID;
        for component in path.components_bytes() {
            cur = self.child_named(cur, component)?;
        }
        Some(cur)
    }

    fn insert(&mut self, parent: NodeId, name: PathComponent, kind: NodeKind, stamp: u64) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        self.nodes.insert(
            id,
            NodeData {
                name: Some(name),
                parent: Some(parent),
                kind,
                stamp,
                writable: true,
                valid: true,
            },
        );
        match &mut self.get_mut(parent).kind {
            NodeKind::Directory { children } => children.push(id),
            NodeKind::File { .. } => unreachable!("stage-vfs bug: inserting into a file"),
        }
        id
    }

    /// Invalidates `id` and everything below it.
    pub(crate) fn invalidate(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            stack.extend_from_slice(self.children(id));
            self.get_mut(id).valid = false;
        }
    }

    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.get(id).parent {
            if let NodeKind::Directory { children } = &mut self.get_mut(parent).kind {
                children.retain(|c| *c != id);
            }
        }
    }
}

struct Inner {
    tree: RwLock<Tree>,
    stamps: StampCounter,
    sink: Box<dyn EventSink>,
}

/// An in-memory file system holding [SourceNode]s.
///
/// The handle is cheap to clone, all clones share the same tree, stamp
/// counter and [EventSink]. Nothing is process-global: every test creates
/// its own instance.
#[derive(Clone)]
pub struct VirtualFileSystem {
    inner: Arc<Inner>,
}

impl fmt::Debug for VirtualFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFileSystem")
            .field("nodes", &self.inner.tree.read().nodes.len())
            .finish()
    }
}

impl VirtualFileSystem {
    /// Creates an empty file system, only containing the root directory.
    pub fn new(sink: impl EventSink + 'static) -> Self {
        let stamps = StampCounter::new();
        let root_stamp = stamps.next();
        Self {
            inner: Arc::new(Inner {
                tree: RwLock::new(Tree::new(root_stamp)),
                stamps,
                sink: Box::new(sink),
            }),
        }
    }

    /// The protocol this file system is addressed with.
    pub fn protocol(&self) -> &'static str {
        "mock"
    }

    pub fn root(&self) -> SourceNode {
        SourceNode::new(self.clone(), ROOT_ID)
    }

    /// Returns a fresh modification stamp, bigger than every stamp handed
    /// out or committed before.
    pub fn next_stamp(&self) -> u64 {
        self.inner.stamps.next()
    }

    /// Looks up the node at the given path.
    pub fn find(&self, path: &str) -> Option<SourceNode> {
        let path: PathBuf = path.parse().ok()?;
        self.find_path(&path)
    }

    pub fn find_path(&self, path: &Path) -> Option<SourceNode> {
        let id = self.inner.tree.read().lookup(path)?;
        Some(SourceNode::new(self.clone(), id))
    }

    /// Creates a file at `path`, creating missing parent directories.
    #[instrument(skip(self, content), err)]
    pub fn create_file(&self, path: &str, content: impl Into<Bytes>) -> Result<SourceNode, Error> {
        let path: PathBuf = path
            .parse()
            .map_err(|_| Error::InvalidPath(path.to_owned()))?;
        let (parent_path, name) = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => (parent.to_owned(), name),
            _ => return Err(Error::Root("created")),
        };

        let mut events = vec![];
        let id = {
            let mut tree = self.inner.tree.write();
            let parent = self.mkdirs(&mut tree, &parent_path, &mut events)?;
            if tree.child_named(parent, name.as_ref()).is_some() {
                return Err(Error::AlreadyExists(path));
            }
            let stamp = self.inner.stamps.next();
            let id = tree.insert(
                parent,
                name,
                NodeKind::File {
                    content: content.into(),
                },
                stamp,
            );
            events.push(VirtualFileEvent::Created {
                node: id,
                path: path.clone(),
            });
            id
        };

        self.emit(events);
        Ok(SourceNode::new(self.clone(), id))
    }

    /// Creates a directory at `path`, including missing parents.
    /// Returns the existing directory if there already is one.
    #[instrument(skip(self), err)]
    pub fn create_dir(&self, path: &str) -> Result<SourceNode, Error> {
        let path: PathBuf = path
            .parse()
            .map_err(|_| Error::InvalidPath(path.to_owned()))?;

        let mut events = vec![];
        let id = {
            let mut tree = self.inner.tree.write();
            self.mkdirs(&mut tree, &path, &mut events)?
        };

        self.emit(events);
        Ok(SourceNode::new(self.clone(), id))
    }

    fn mkdirs(
        &self,
        tree: &mut Tree,
        path: &Path,
        events: &mut Vec<VirtualFileEvent>,
    ) -> Result<NodeId, Error> {
        let mut cur = ROOT_ID;
        let mut cur_path = PathBuf::new();
        for component in path.components() {
            cur_path.push(&component);
            cur = match tree.child_named(cur, component.as_ref()) {
                Some(id) => match tree.get(id).kind {
                    NodeKind::Directory { .. } => id,
                    NodeKind::File { .. } => return Err(Error::NotADirectory(cur_path)),
                },
                None => {
                    let stamp = self.inner.stamps.next();
                    let id = tree.insert(
                        cur,
                        component,
                        NodeKind::Directory { children: vec![] },
                        stamp,
                    );
                    debug!(path = %cur_path, "created directory");
                    events.push(VirtualFileEvent::Created {
                        node: id,
                        path: cur_path.clone(),
                    });
                    id
                }
            };
        }
        Ok(cur)
    }

    pub(crate) fn tree(&self) -> &RwLock<Tree> {
        &self.inner.tree
    }

    pub(crate) fn stamps(&self) -> &StampCounter {
        &self.inner.stamps
    }

    /// Delivers events to the sink. Must be called without holding the tree lock.
    pub(crate) fn emit(&self, events: impl IntoIterator<Item = VirtualFileEvent>) {
        for event in events {
            self.inner.sink.handle(&event);
        }
    }

    pub(crate) fn same_as(&self, other: &VirtualFileSystem) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::VirtualFileSystem;
    use crate::events::{NoopEventSink, RecordingEventSink, VirtualFileEvent};
    use crate::Error;
    use std::sync::Arc;

    #[test]
    fn create_file_creates_parents() {
        let sink = Arc::new(RecordingEventSink::new());
        let fs = VirtualFileSystem::new(sink.clone());

        let file = fs.create_file("a/b/c.txt", "text").expect("must succeed");
        assert_eq!("a/b/c.txt", file.path().to_string());

        let b = fs.find("a/b").expect("a/b must exist");
        assert!(b.is_directory());
        assert_eq!(vec![file.clone()], b.children());

        let created = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, VirtualFileEvent::Created { .. }))
            .count();
        assert_eq!(3, created, "a, a/b and a/b/c.txt must be announced");
    }

    #[test]
    fn create_file_twice_fails() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        fs.create_file("a.txt", "1").expect("must succeed");
        assert!(matches!(
            fs.create_file("a.txt", "2"),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn create_below_file_fails() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        fs.create_file("a", "1").expect("must succeed");
        assert!(matches!(
            fs.create_file("a/b.txt", "2"),
            Err(Error::NotADirectory(_))
        ));
    }

    #[test]
    fn create_dir_is_idempotent() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        let d1 = fs.create_dir("x/y").expect("must succeed");
        let d2 = fs.create_dir("x/y").expect("must succeed");
        assert_eq!(d1, d2);
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        assert!(matches!(
            fs.create_file("../a", "x"),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(fs.create_file("", "x"), Err(Error::InvalidPath(_)) | Err(Error::Root(_))));
    }

    #[test]
    fn stamps_increase() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        let a = fs.create_file("a", "").unwrap();
        let b = fs.create_file("b", "").unwrap();
        assert!(b.modification_stamp() > a.modification_stamp());
        assert!(fs.next_stamp() > b.modification_stamp());
    }

    #[test]
    fn separate_instances_do_not_share_state() {
        let fs1 = VirtualFileSystem::new(NoopEventSink);
        let fs2 = VirtualFileSystem::new(NoopEventSink);
        fs1.create_file("a.txt", "x").unwrap();
        assert!(fs2.find("a.txt").is_none());
    }
}
