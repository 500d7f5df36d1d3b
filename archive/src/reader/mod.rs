//! Parser for the archive format.
//!
//! Unlike the streaming [crate::writer], the reader materializes the whole
//! member tree: archives produced by the packager are small, and they are
//! always inspected as a whole.

use bytes::Bytes;
use rustc_hash::FxHashSet;
use std::io::{
    self, BufRead,
    ErrorKind::{InvalidData, UnexpectedEof},
    Read,
};
use stage_vfs::path::PathComponent;

use crate::{wire, Member};

mod read;
#[cfg(test)]
mod test;

pub type Reader<'a> = dyn BufRead + Send + 'a;

/// Maximum directory nesting accepted by the reader.
pub const MAX_DEPTH: usize = 256;

/// Read a complete archive from `reader`, returning the members of its
/// root directory. Trailing data after the archive is rejected.
pub fn open(reader: &mut Reader) -> io::Result<Vec<Member>> {
    read::token(reader, &wire::TOK_ARC)?;

    let members = match node(reader)? {
        Node::Directory => directory(reader, 0)?,
        Node::File => return Err(io::Error::new(InvalidData, "archive root is not a directory")),
    };

    if !reader.fill_buf()?.is_empty() {
        return Err(io::Error::new(InvalidData, "trailing data after archive"));
    }

    Ok(members)
}

enum Node {
    File,
    Directory,
}

/// Read the token opening a node, after [wire::TOK_ARC] or [wire::TOK_NOD].
fn node(reader: &mut Reader) -> io::Result<Node> {
    match read::one_of(reader, &[&wire::TOK_REG, &wire::TOK_DIR])? {
        0 => Ok(Node::File),
        _ => Ok(Node::Directory),
    }
}

/// Whether another entry follows in a directory. Consumes [wire::TOK_ENT],
/// or the [wire::TOK_PAR] closing the directory.
fn next_entry(reader: &mut Reader) -> io::Result<bool> {
    Ok(read::one_of(reader, &[&wire::TOK_PAR, &wire::TOK_ENT])? == 1)
}

/// Read the entries of a directory, starting after [wire::TOK_DIR] and
/// consuming the terminating [wire::TOK_PAR].
fn directory(reader: &mut Reader, depth: usize) -> io::Result<Vec<Member>> {
    if depth > MAX_DEPTH {
        return Err(io::Error::new(InvalidData, "archive nested too deeply"));
    }

    let mut members = vec![];
    let mut names = FxHashSet::default();

    while next_entry(reader)? {
        let name = read::bytes(reader, wire::MAX_NAME_LEN)?;
        let name = PathComponent::try_from(Bytes::from(name))
            .map_err(|e| io::Error::new(InvalidData, e))?;

        if !names.insert(name.clone()) {
            return Err(io::Error::new(
                InvalidData,
                format!("duplicate entry name: {name}"),
            ));
        }

        read::token(reader, &wire::TOK_NOD)?;

        let member = match node(reader)? {
            Node::File => Member::File {
                name,
                content: file(reader)?,
            },
            Node::Directory => Member::Directory {
                name,
                children: directory(reader, depth + 1)?,
            },
        };
        members.push(member);

        // terminates the entry
        read::token(reader, &wire::TOK_PAR)?;
    }

    Ok(members)
}

/// Read file contents, starting after [wire::TOK_REG] and consuming the
/// padding and the terminating [wire::TOK_PAR].
fn file(reader: &mut Reader) -> io::Result<Bytes> {
    let len = read::u64(reader)?;

    let mut buf = vec![];
    let n = Read::take(&mut *reader, len).read_to_end(&mut buf)?;
    if n as u64 != len {
        return Err(UnexpectedEof.into());
    }

    read::padding(reader, len)?;
    read::token(reader, &wire::TOK_PAR)?;

    Ok(buf.into())
}
