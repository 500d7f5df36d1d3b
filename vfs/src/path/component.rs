use bstr::ByteSlice;
use bytes::Bytes;
use std::fmt;

/// Longest name a node may have, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// The name of a single node: non-empty, at most [MAX_NAME_LEN] bytes,
/// neither `.` nor `..`, and free of `/` and NUL.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathComponent {
    pub(super) inner: Bytes,
}

/// Why a name is not a valid [PathComponent].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathComponentError {
    #[error("name is empty")]
    Empty,
    #[error("{0:?} is reserved")]
    Reserved(String),
    #[error("{0:?} contains a slash")]
    Slash(String),
    #[error("{0:?} contains a NUL byte")]
    Nul(String),
    #[error("name is {0} bytes long, at most {max} are allowed", max = MAX_NAME_LEN)]
    TooLong(usize),
}

pub(super) fn validate_name(name: &[u8]) -> Result<(), PathComponentError> {
    let lossy = || name.to_str_lossy().into_owned();
    match name {
        b"" => Err(PathComponentError::Empty),
        b"." | b".." => Err(PathComponentError::Reserved(lossy())),
        _ if name.len() > MAX_NAME_LEN => Err(PathComponentError::TooLong(name.len())),
        _ if name.contains(&b'/') => Err(PathComponentError::Slash(lossy())),
        _ if name.contains(&0) => Err(PathComponentError::Nul(lossy())),
        _ => Ok(()),
    }
}

impl PathComponent {
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.inner).ok()
    }

    pub fn to_string_lossy(&self) -> String {
        self.inner.to_str_lossy().into_owned()
    }
}

impl AsRef<[u8]> for PathComponent {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl TryFrom<Bytes> for PathComponent {
    type Error = PathComponentError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        validate_name(&value)?;
        Ok(Self { inner: value })
    }
}

impl TryFrom<&str> for PathComponent {
    type Error = PathComponentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl fmt::Debug for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self.inner.as_bstr(), f)
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self.inner.as_bstr(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::{PathComponent, PathComponentError, MAX_NAME_LEN};
    use rstest::rstest;

    #[rstest]
    #[case::empty("", PathComponentError::Empty)]
    #[case::dot(".", PathComponentError::Reserved(".".into()))]
    #[case::dotdot("..", PathComponentError::Reserved("..".into()))]
    #[case::slash("a/b", PathComponentError::Slash("a/b".into()))]
    #[case::nul("a\0", PathComponentError::Nul("a\0".into()))]
    fn invalid(#[case] name: &str, #[case] err: PathComponentError) {
        assert_eq!(Err(err), PathComponent::try_from(name).map(|_| ()));
    }

    #[test]
    fn length_limit() {
        let name = "x".repeat(MAX_NAME_LEN);
        assert!(PathComponent::try_from(name.as_str()).is_ok());
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            Err(PathComponentError::TooLong(MAX_NAME_LEN + 1)),
            PathComponent::try_from(name.as_str()).map(|_| ())
        );
    }

    #[rstest]
    #[case::plain("a.txt")]
    #[case::dotfile(".keep")]
    #[case::dots("...")]
    fn valid(#[case] s: &str) {
        let c = PathComponent::try_from(s).expect("must succeed");
        assert_eq!(Some(s), c.to_str());
        assert_eq!(s, c.to_string());
    }
}
