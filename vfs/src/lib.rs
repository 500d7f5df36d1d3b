//! An in-memory virtual file system.
//!
//! Files and directories live in a single tree owned by a
//! [VirtualFileSystem]. Every node carries a modification stamp, which only
//! ever grows, and every committed mutation is reported to the [EventSink]
//! the file system was created with.

mod errors;
pub mod events;
mod fs;
mod node;
pub mod path;
mod stream;

pub use errors::Error;
pub use events::{EventSink, NoopEventSink, RecordingEventSink, VirtualFileEvent};
pub use fs::{NodeId, VirtualFileSystem};
pub use node::SourceNode;
pub use stream::OutputStream;
