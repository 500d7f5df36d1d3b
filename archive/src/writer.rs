//! Streaming writer for the archive format.
//!
//! ```rust
//! # use std::io::BufReader;
//! let mut sink: Vec<u8> = Vec::new();
//! let mut root = stage_archive::writer::open(&mut sink)?.directory()?;
//!
//! let content = b"Hello World!";
//! root.entry(b"hello.txt")?
//!     .file(content.len() as u64, &mut BufReader::new(&content[..]))?;
//! root.close()?;
//! # Ok::<(), std::io::Error>(())
//! ```

use rustc_hash::FxHashSet;
use std::io::{
    self, BufRead,
    ErrorKind::{InvalidInput, UnexpectedEof},
    Write,
};
use stage_vfs::path::PathComponent;

use crate::{wire, Member};

/// Convenience type alias for types implementing [`Write`].
pub type Writer<'a> = dyn Write + Send + 'a;

/// Create a new archive, writing the output to the specified writer.
pub fn open<'a, 'w: 'a>(writer: &'a mut Writer<'w>) -> io::Result<Node<'a, 'w>> {
    let mut node = Node { writer };
    node.write(&wire::TOK_ARC)?;
    Ok(node)
}

/// Single node of an archive, either a file or a directory.
pub struct Node<'a, 'w: 'a> {
    writer: &'a mut Writer<'w>,
}

impl<'a, 'w> Node<'a, 'w> {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)
    }

    fn pad(&mut self, n: u64) -> io::Result<()> {
        match (n & 7) as usize {
            0 => Ok(()),
            n => self.write(&[0; 8][n..]),
        }
    }

    /// Make this node a file with `size` bytes read from `reader`.
    pub fn file(mut self, size: u64, reader: &mut dyn BufRead) -> io::Result<()> {
        self.write(&wire::TOK_REG)?;
        self.write(&size.to_le_bytes())?;

        let mut need = size;
        while need != 0 {
            let data = reader.fill_buf()?;

            if data.is_empty() {
                return Err(UnexpectedEof.into());
            }

            let n = need.min(data.len() as u64) as usize;
            self.write(&data[..n])?;

            need -= n as u64;
            reader.consume(n);
        }

        if reader.fill_buf().map(|b| !b.is_empty())? {
            return Err(io::Error::new(
                InvalidInput,
                "reader contained more data than specified size",
            ));
        }

        self.pad(size)?;
        self.write(&wire::TOK_PAR)?;

        Ok(())
    }

    /// Make this node a file holding `content`.
    pub fn bytes(self, content: &[u8]) -> io::Result<()> {
        let mut reader = content;
        self.file(content.len() as u64, &mut reader)
    }

    /// Make this node a directory, the content of which is set using the
    /// resulting [`Directory`] value.
    pub fn directory(mut self) -> io::Result<Directory<'a, 'w>> {
        self.write(&wire::TOK_DIR)?;
        Ok(Directory::new(self))
    }

    /// Write a [Member] (recursively) into this node.
    pub fn member(self, member: &Member) -> io::Result<()> {
        match member {
            Member::File { content, .. } => self.bytes(content),
            Member::Directory { children, .. } => self.members(children),
        }
    }

    /// Make this node a directory holding `members`, in the given order.
    pub fn members(self, members: &[Member]) -> io::Result<()> {
        let mut dir = self.directory()?;
        for member in members {
            dir.entry(member.name().as_ref())?.member(member)?;
        }
        dir.close()
    }
}

/// Content of an archive node that represents a directory.
pub struct Directory<'a, 'w> {
    node: Node<'a, 'w>,
    names: FxHashSet<Vec<u8>>,
}

impl<'a, 'w> Directory<'a, 'w> {
    fn new(node: Node<'a, 'w>) -> Self {
        Self {
            node,
            names: FxHashSet::default(),
        }
    }

    /// Add an entry to the directory.
    ///
    /// Entries are kept in the order they are added. Names must be valid
    /// path components and unique in this directory.
    pub fn entry(&mut self, name: &[u8]) -> io::Result<Node<'_, 'w>> {
        PathComponent::try_from(bytes::Bytes::copy_from_slice(name))
            .map_err(|e| io::Error::new(InvalidInput, e))?;

        if self.names.contains(name) {
            return Err(io::Error::new(
                InvalidInput,
                format!("duplicate entry name: {}", String::from_utf8_lossy(name)),
            ));
        }

        // terminate the previous entry, if any
        if !self.names.is_empty() {
            self.node.write(&wire::TOK_PAR)?;
        }
        self.names.insert(name.to_vec());

        self.node.write(&wire::TOK_ENT)?;
        self.node.write(&name.len().to_le_bytes())?;
        self.node.write(name)?;
        self.node.pad(name.len() as u64)?;
        self.node.write(&wire::TOK_NOD)?;

        Ok(Node {
            writer: &mut *self.node.writer,
        })
    }

    /// Close a directory and write terminators for the directory.
    ///
    /// **Important:** This *must* be called when all entries have been written
    /// in a directory, otherwise the resulting archive will be invalid.
    pub fn close(mut self) -> io::Result<()> {
        if !self.names.is_empty() {
            self.node.write(&wire::TOK_PAR)?;
        }

        self.node.write(&wire::TOK_PAR)?;
        Ok(())
    }
}
