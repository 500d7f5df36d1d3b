use bytes::Bytes;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, instrument};

use crate::events::VirtualFileEvent;
use crate::fs::{NodeKind, ROOT_ID};
use crate::path::{PathBuf, PathComponent};
use crate::{Error, NodeId, OutputStream, VirtualFileSystem};

/// Handle to a file or directory inside a [VirtualFileSystem].
///
/// The handle carries the file system it belongs to, so no ambient state is
/// needed to read or mutate it. Handles stay valid across renames; after
/// [SourceNode::delete] most operations fail with [Error::Invalid].
#[derive(Clone)]
pub struct SourceNode {
    fs: VirtualFileSystem,
    id: NodeId,
}

impl SourceNode {
    pub(crate) fn new(fs: VirtualFileSystem, id: NodeId) -> Self {
        Self { fs, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn file_system(&self) -> &VirtualFileSystem {
        &self.fs
    }

    /// The (base)name of this node. The root directory has no name.
    pub fn name(&self) -> Result<PathComponent, Error> {
        self.fs
            .tree()
            .read()
            .get(self.id)
            .name
            .clone()
            .ok_or(Error::Root("named"))
    }

    /// Path of this node, relative to the root of its file system.
    pub fn path(&self) -> PathBuf {
        self.fs.tree().read().path_of(self.id)
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    pub fn is_directory(&self) -> bool {
        matches!(
            self.fs.tree().read().get(self.id).kind,
            NodeKind::Directory { .. }
        )
    }

    pub fn is_valid(&self) -> bool {
        self.fs.tree().read().get(self.id).valid
    }

    pub fn is_writable(&self) -> bool {
        self.fs.tree().read().get(self.id).writable
    }

    pub fn modification_stamp(&self) -> u64 {
        self.fs.tree().read().get(self.id).stamp
    }

    /// Returns the current contents of this file.
    pub fn content(&self) -> Result<Bytes, Error> {
        let tree = self.fs.tree().read();
        let data = tree.get(self.id);
        if !data.valid {
            return Err(Error::Invalid(tree.path_of(self.id)));
        }
        match &data.kind {
            NodeKind::File { content } => Ok(content.clone()),
            NodeKind::Directory { .. } => Err(Error::IsADirectory(tree.path_of(self.id))),
        }
    }

    /// Length of the contents in bytes.
    pub fn len(&self) -> Result<u64, Error> {
        Ok(self.content()?.len() as u64)
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }

    /// Opens a stream replacing the contents of this file.
    ///
    /// Nothing written becomes visible until [OutputStream::close] commits
    /// the new contents together with `new_stamp`.
    pub fn output_stream(
        &self,
        requestor: impl Into<String>,
        new_stamp: u64,
    ) -> Result<OutputStream, Error> {
        self.check_writable_file()?;
        Ok(OutputStream::new(self.clone(), requestor.into(), new_stamp))
    }

    fn check_writable_file(&self) -> Result<(), Error> {
        let tree = self.fs.tree().read();
        let data = tree.get(self.id);
        if !data.valid {
            return Err(Error::Invalid(tree.path_of(self.id)));
        }
        if matches!(data.kind, NodeKind::Directory { .. }) {
            return Err(Error::IsADirectory(tree.path_of(self.id)));
        }
        if !data.writable {
            return Err(Error::ReadOnly(tree.path_of(self.id)));
        }
        Ok(())
    }

    /// Commits `content` with `new_stamp`. Used by [OutputStream::close].
    pub(crate) fn commit(
        &self,
        requestor: String,
        content: Bytes,
        new_stamp: u64,
    ) -> Result<(), Error> {
        let event = {
            let mut tree = self.fs.tree().write();
            // re-check, things might have changed while the stream was open.
            let path = tree.path_of(self.id);
            let data = tree.get_mut(self.id);
            if !data.valid {
                return Err(Error::Invalid(path));
            }
            if !data.writable {
                return Err(Error::ReadOnly(path));
            }
            let old_stamp = data.stamp;
            if new_stamp <= old_stamp {
                return Err(Error::StaleStamp {
                    path,
                    current: old_stamp,
                    new: new_stamp,
                });
            }
            match &mut data.kind {
                NodeKind::File { content: c } => *c = content,
                NodeKind::Directory { .. } => return Err(Error::IsADirectory(path)),
            }
            data.stamp = new_stamp;
            self.fs.stamps().observe(new_stamp);

            VirtualFileEvent::ContentsChanged {
                requestor,
                node: self.id,
                path,
                old_stamp,
                new_stamp,
            }
        };

        self.fs.emit([event]);
        Ok(())
    }

    /// Replaces the contents of this file.
    ///
    /// With `fire_event` the modification stamp is bumped and a
    /// [VirtualFileEvent::ContentsChanged] is emitted. Without it, only the
    /// bytes change, which makes the change invisible to stamp-based
    /// staleness checks.
    #[instrument(skip(self, content), fields(node = %self.id), err)]
    pub fn set_content(
        &self,
        requestor: &str,
        content: impl Into<Bytes>,
        fire_event: bool,
    ) -> Result<(), Error> {
        let event = {
            let mut tree = self.fs.tree().write();
            let path = tree.path_of(self.id);
            let data = tree.get_mut(self.id);
            if !data.valid {
                return Err(Error::Invalid(path));
            }
            match &mut data.kind {
                NodeKind::File { content: c } => *c = content.into(),
                NodeKind::Directory { .. } => return Err(Error::IsADirectory(path)),
            }

            if !fire_event {
                return Ok(());
            }

            let old_stamp = data.stamp;
            data.stamp = self.fs.stamps().next();
            VirtualFileEvent::ContentsChanged {
                requestor: requestor.to_owned(),
                node: self.id,
                path,
                old_stamp,
                new_stamp: data.stamp,
            }
        };

        self.fs.emit([event]);
        Ok(())
    }

    /// Renames this node inside its parent directory.
    #[instrument(skip(self), fields(node = %self.id), err)]
    pub fn rename(&self, requestor: &str, new_name: &str) -> Result<(), Error> {
        let new_name = PathComponent::try_from(new_name)?;

        let event = {
            let mut tree = self.fs.tree().write();
            let data = tree.get(self.id);
            if !data.valid {
                return Err(Error::Invalid(tree.path_of(self.id)));
            }
            let (parent, old_name) = match (data.parent, data.name.clone()) {
                (Some(parent), Some(old_name)) => (parent, old_name),
                _ => return Err(Error::Root("renamed")),
            };
            if old_name == new_name {
                return Ok(());
            }
            if tree.child_named(parent, new_name.as_ref()).is_some() {
                return Err(Error::AlreadyExists(tree.path_of(parent).join(&new_name)));
            }

            tree.get_mut(self.id).name = Some(new_name.clone());
            debug!(%old_name, %new_name, "renamed");

            VirtualFileEvent::Renamed {
                requestor: requestor.to_owned(),
                node: self.id,
                old_name,
                new_name,
            }
        };

        self.fs.emit([event]);
        Ok(())
    }

    pub fn set_writable(&self, writable: bool) {
        let event = {
            let mut tree = self.fs.tree().write();
            let path = tree.path_of(self.id);
            let data = tree.get_mut(self.id);
            if data.writable == writable {
                return;
            }
            data.writable = writable;
            VirtualFileEvent::WritableChanged {
                node: self.id,
                path,
                writable,
            }
        };
        self.fs.emit([event]);
    }

    /// Removes this node (and everything below it) from the tree.
    /// The handle keeps working for [SourceNode::name] and [SourceNode::path],
    /// which report the last known location.
    #[instrument(skip(self), fields(node = %self.id), err)]
    pub fn delete(&self, requestor: &str) -> Result<(), Error> {
        if self.is_root() {
            return Err(Error::Root("deleted"));
        }

        let event = {
            let mut tree = self.fs.tree().write();
            let path = tree.path_of(self.id);
            if !tree.get(self.id).valid {
                return Err(Error::Invalid(path));
            }
            tree.detach(self.id);
            tree.invalidate(self.id);

            VirtualFileEvent::Deleted {
                requestor: requestor.to_owned(),
                node: self.id,
                path,
            }
        };

        self.fs.emit([event]);
        Ok(())
    }

    pub fn parent(&self) -> Option<SourceNode> {
        let parent = self.fs.tree().read().get(self.id).parent?;
        Some(SourceNode::new(self.fs.clone(), parent))
    }

    /// Children of a directory, in creation order. Empty for files.
    pub fn children(&self) -> Vec<SourceNode> {
        self.fs
            .tree()
            .read()
            .children(self.id)
            .iter()
            .map(|id| SourceNode::new(self.fs.clone(), *id))
            .collect()
    }

    pub fn child(&self, name: &str) -> Option<SourceNode> {
        let id = self
            .fs
            .tree()
            .read()
            .child_named(self.id, name.as_bytes())?;
        Some(SourceNode::new(self.fs.clone(), id))
    }

    /// Whether this node is `other` or one of its ancestors.
    pub fn is_ancestor_of(&self, other: &SourceNode) -> bool {
        if !self.fs.same_as(&other.fs) {
            return false;
        }
        let tree = self.fs.tree().read();
        let mut cur = Some(other.id);
        while let Some(id) = cur {
            if id == self.id {
                return true;
            }
            cur = tree.get(id).parent;
        }
        false
    }
}

impl PartialEq for SourceNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.fs.same_as(&other.fs)
    }
}

impl Eq for SourceNode {}

impl Hash for SourceNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for SourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceNode({}, {:?})", self.id, self.path())
    }
}

impl fmt::Display for SourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.fs.protocol(), self.path())
    }
}

#[cfg(test)]
mod tests {
    use crate::events::{NoopEventSink, RecordingEventSink, VirtualFileEvent};
    use crate::{Error, VirtualFileSystem};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn set_content_with_event_bumps_stamp() {
        let sink = Arc::new(RecordingEventSink::new());
        let fs = VirtualFileSystem::new(sink.clone());
        let file = fs.create_file("a.txt", "text").unwrap();
        let old_stamp = file.modification_stamp();
        sink.take();

        file.set_content("test", "new text", true).unwrap();

        assert_eq!(&b"new text"[..], &file.content().unwrap()[..]);
        let new_stamp = file.modification_stamp();
        assert!(new_stamp > old_stamp);
        assert_eq!(
            vec![VirtualFileEvent::ContentsChanged {
                requestor: "test".into(),
                node: file.id(),
                path: "a.txt".parse().unwrap(),
                old_stamp,
                new_stamp,
            }],
            sink.events()
        );
    }

    #[test]
    fn set_content_without_event_keeps_stamp() {
        let sink = Arc::new(RecordingEventSink::new());
        let fs = VirtualFileSystem::new(sink.clone());
        let file = fs.create_file("a.txt", "text").unwrap();
        let stamp = file.modification_stamp();
        sink.take();

        file.set_content("test", "quiet", false).unwrap();

        assert_eq!(&b"quiet"[..], &file.content().unwrap()[..]);
        assert_eq!(stamp, file.modification_stamp());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn rename_keeps_identity() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        let file = fs.create_file("dir/a.txt", "x").unwrap();
        file.rename("test", "b.txt").unwrap();

        assert_eq!("b.txt", file.name().unwrap().to_string());
        assert_eq!("dir/b.txt", file.path().to_string());
        assert_eq!(Some(file.clone()), fs.find("dir/b.txt"));
        assert!(fs.find("dir/a.txt").is_none());
    }

    #[test]
    fn rename_collision_fails() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        let a = fs.create_file("a.txt", "x").unwrap();
        fs.create_file("b.txt", "y").unwrap();
        assert!(matches!(
            a.rename("test", "b.txt"),
            Err(Error::AlreadyExists(_))
        ));
        assert!(matches!(
            a.rename("test", "x/y"),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn root_cannot_be_renamed_or_deleted() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        assert_eq!(Err(Error::Root("renamed")), fs.root().rename("t", "x"));
        assert_eq!(Err(Error::Root("deleted")), fs.root().delete("t"));
        assert!(fs.root().name().is_err());
    }

    #[test]
    fn delete_invalidates_subtree() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        let file = fs.create_file("a/b/c.txt", "x").unwrap();
        let a = fs.find("a").unwrap();

        a.delete("test").unwrap();

        assert!(!a.is_valid());
        assert!(!file.is_valid());
        assert!(fs.find("a").is_none());
        assert!(fs.root().children().is_empty());
        assert!(matches!(file.content(), Err(Error::Invalid(_))));
        // the handle still knows where it used to live
        assert_eq!("a/b/c.txt", file.path().to_string());
    }

    #[test]
    fn directories_have_no_content() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        let dir = fs.create_dir("d").unwrap();
        assert!(matches!(dir.content(), Err(Error::IsADirectory(_))));
        assert!(matches!(
            dir.output_stream("test", 100),
            Err(Error::IsADirectory(_))
        ));
    }

    #[test]
    fn is_ancestor_of() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        let file = fs.create_file("a/b/c.txt", "x").unwrap();
        let a = fs.find("a").unwrap();
        let other = fs.create_file("d.txt", "x").unwrap();

        assert!(a.is_ancestor_of(&file));
        assert!(file.is_ancestor_of(&file));
        assert!(!file.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&other));
        assert!(fs.root().is_ancestor_of(&other));
    }

    #[test]
    fn parent_and_children() {
        let fs = VirtualFileSystem::new(NoopEventSink);
        let file = fs.create_file("a/b.txt", "x").unwrap();
        let a = file.parent().unwrap();
        assert_eq!("a", a.path().to_string());
        assert_eq!(Some(file), a.child("b.txt"));
        assert_eq!(Some(fs.root()), a.parent());
        assert!(fs.root().parent().is_none());
    }

    #[test]
    fn writable_flag() {
        let sink = Arc::new(RecordingEventSink::new());
        let fs = VirtualFileSystem::new(sink.clone());
        let file = fs.create_file("a.txt", "x").unwrap();
        assert!(file.is_writable());
        sink.take();

        file.set_writable(false);
        file.set_writable(false);

        assert!(!file.is_writable());
        assert_eq!(1, sink.events().len(), "unchanged flag must not be announced");
    }
}
