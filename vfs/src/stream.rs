use bytes::{BufMut, Bytes, BytesMut};
use std::io;
use tracing::{instrument, warn};

use crate::{Error, SourceNode};

/// Replaces the contents of a file.
///
/// Writes go to an in-memory buffer. [OutputStream::close] commits buffer and
/// modification stamp together, so readers either see the old contents with
/// the old stamp, or the new contents with the new stamp.
/// Dropping the stream without closing it discards everything written.
#[derive(Debug)]
pub struct OutputStream {
    node: SourceNode,
    requestor: String,
    new_stamp: u64,
    buf: BytesMut,
}

impl OutputStream {
    pub(crate) fn new(node: SourceNode, requestor: String, new_stamp: u64) -> Self {
        Self {
            node,
            requestor,
            new_stamp,
            buf: BytesMut::new(),
        }
    }

    pub fn node(&self) -> &SourceNode {
        &self.node
    }

    /// Number of bytes buffered so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Commits the buffered bytes as the new contents of the file.
    #[instrument(skip(self), fields(node = %self.node.id(), len = self.buf.len()), err)]
    pub fn close(self) -> Result<(), Error> {
        let content: Bytes = self.buf.freeze();
        self.node
            .commit(self.requestor, content, self.new_stamp)
            .inspect_err(|e| warn!(err = %e, "unable to commit"))
    }
}

impl io::Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::events::{RecordingEventSink, VirtualFileEvent};
    use crate::{Error, VirtualFileSystem};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::sync::Arc;

    #[test]
    fn nothing_visible_before_close() {
        let sink = Arc::new(RecordingEventSink::new());
        let fs = VirtualFileSystem::new(sink.clone());
        let file = fs.create_file("a.txt", "old").unwrap();
        let old_stamp = file.modification_stamp();
        sink.take();

        let new_stamp = fs.next_stamp();
        let mut stream = file.output_stream("test", new_stamp).unwrap();
        stream.write_all(b"new").unwrap();

        assert_eq!(&b"old"[..], &file.content().unwrap()[..]);
        assert_eq!(old_stamp, file.modification_stamp());
        assert!(sink.events().is_empty());

        stream.close().unwrap();

        assert_eq!(&b"new"[..], &file.content().unwrap()[..]);
        assert_eq!(new_stamp, file.modification_stamp());
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
    fn drop_discards() {
        let fs = VirtualFileSystem::new(RecordingEventSink::new());
        let file = fs.create_file("a.txt", "old").unwrap();
        {
            let mut stream = file.output_stream("test", fs.next_stamp()).unwrap();
            stream.write_all(b"new").unwrap();
        }
        assert_eq!(&b"old"[..], &file.content().unwrap()[..]);
    }

    #[test]
    fn stale_stamp_rejected() {
        let fs = VirtualFileSystem::new(RecordingEventSink::new());
        let file = fs.create_file("a.txt", "old").unwrap();
        let current = file.modification_stamp();

        let stream = file.output_stream("test", current).unwrap();
        assert!(matches!(stream.close(), Err(Error::StaleStamp { .. })));
        assert_eq!(&b"old"[..], &file.content().unwrap()[..]);
    }

    #[test]
    fn committed_stamp_is_observed() {
        let fs = VirtualFileSystem::new(RecordingEventSink::new());
        let file = fs.create_file("a.txt", "old").unwrap();

        file.output_stream("test", 1000).unwrap().close().unwrap();

        assert!(fs.next_stamp() > 1000);
    }

    #[test]
    fn read_only_rejected() {
        let fs = VirtualFileSystem::new(RecordingEventSink::new());
        let file = fs.create_file("a.txt", "old").unwrap();
        let stream = file.output_stream("test", fs.next_stamp()).unwrap();

        file.set_writable(false);

        assert!(matches!(stream.close(), Err(Error::ReadOnly(_))));
        assert!(matches!(
            file.output_stream("test", fs.next_stamp()),
            Err(Error::ReadOnly(_))
        ));
    }

    #[test]
    fn deleted_while_open() {
        let fs = VirtualFileSystem::new(RecordingEventSink::new());
        let file = fs.create_file("a.txt", "old").unwrap();
        let stream = file.output_stream("test", fs.next_stamp()).unwrap();
        file.delete("test").unwrap();
        assert!(matches!(stream.close(), Err(Error::Invalid(_))));
    }
}
