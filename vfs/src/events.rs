//! Change notification for virtual files.
//!
//! Every [crate::VirtualFileSystem] is constructed with an [EventSink], which
//! receives a [VirtualFileEvent] after each committed mutation.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::path::{PathBuf, PathComponent};
use crate::NodeId;

/// Describes a committed change to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualFileEvent {
    Created {
        node: NodeId,
        path: PathBuf,
    },
    ContentsChanged {
        requestor: String,
        node: NodeId,
        path: PathBuf,
        old_stamp: u64,
        new_stamp: u64,
    },
    Renamed {
        requestor: String,
        node: NodeId,
        old_name: PathComponent,
        new_name: PathComponent,
    },
    WritableChanged {
        node: NodeId,
        path: PathBuf,
        writable: bool,
    },
    Deleted {
        requestor: String,
        node: NodeId,
        path: PathBuf,
    },
}

impl VirtualFileEvent {
    /// The node this event is about.
    pub fn node(&self) -> NodeId {
        match self {
            VirtualFileEvent::Created { node, .. }
            | VirtualFileEvent::ContentsChanged { node, .. }
            | VirtualFileEvent::Renamed { node, .. }
            | VirtualFileEvent::WritableChanged { node, .. }
            | VirtualFileEvent::Deleted { node, .. } => *node,
        }
    }
}

/// Receives [VirtualFileEvent]s.
///
/// Events are delivered after the file system lock has been released, so a
/// sink may freely read from the file system.
pub trait EventSink: Send + Sync {
    fn handle(&self, event: &VirtualFileEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn handle(&self, event: &VirtualFileEvent) {
        (**self).handle(event)
    }
}

/// Drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn handle(&self, _event: &VirtualFileEvent) {}
}

/// Keeps all events in memory, for later inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<VirtualFileEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all events received so far.
    pub fn events(&self) -> Vec<VirtualFileEvent> {
        self.events.lock().clone()
    }

    /// Returns and forgets all events received so far.
    pub fn take(&self) -> Vec<VirtualFileEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingEventSink {
    fn handle(&self, event: &VirtualFileEvent) {
        self.events.lock().push(event.clone());
    }
}
