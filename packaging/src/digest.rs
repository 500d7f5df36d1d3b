use data_encoding::BASE64;

pub const B3_LEN: usize = 32;

/// blake3 digest of an output entry.
///
/// Files and archives are digested over their bytes, directories over the
/// names and digests of their children.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct B3Digest([u8; B3_LEN]);

impl B3Digest {
    pub fn of(data: &[u8]) -> Self {
        blake3::hash(data).into()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<blake3::Hash> for B3Digest {
    fn from(value: blake3::Hash) -> Self {
        Self(*value.as_bytes())
    }
}

impl From<&[u8; B3_LEN]> for B3Digest {
    fn from(value: &[u8; B3_LEN]) -> Self {
        Self(*value)
    }
}

impl From<B3Digest> for [u8; B3_LEN] {
    fn from(value: B3Digest) -> Self {
        value.0
    }
}

impl std::fmt::Display for B3Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b3:{}", BASE64.encode(&self.0))
    }
}

impl std::fmt::Debug for B3Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b3:{}", BASE64.encode(&self.0))
    }
}

/// Kind byte mixed into directory digests, so a file and a directory with
/// colliding digests can't be confused.
#[derive(Clone, Copy)]
#[repr(u8)]
pub(crate) enum EntryKind {
    File = 1,
    Directory = 2,
    Archive = 3,
}

/// Accumulates the digest of a directory, one child at a time.
pub(crate) struct DirectoryHasher(blake3::Hasher);

impl DirectoryHasher {
    pub(crate) fn new() -> Self {
        Self(blake3::Hasher::new())
    }

    pub(crate) fn child(&mut self, name: &[u8], kind: EntryKind, digest: &B3Digest) -> &mut Self {
        self.0.update(&(name.len() as u64).to_le_bytes());
        self.0.update(name);
        self.0.update(&[kind as u8]);
        self.0.update(digest.as_slice());
        self
    }

    pub(crate) fn finalize(&self) -> B3Digest {
        self.0.finalize().into()
    }
}
