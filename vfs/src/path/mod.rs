//! Paths of nodes in a [crate::VirtualFileSystem], and of entries in the
//! output trees built from it.
//!
//! A path is a sequence of [PathComponent]s joined by `/`. It is always
//! relative to a root, which is the empty path.
use bstr::ByteSlice;
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

mod component;
pub use component::{PathComponent, PathComponentError, MAX_NAME_LEN};

/// A borrowed path. Every `/`-separated part is a valid [PathComponent].
#[derive(Eq, Hash, PartialEq)]
#[repr(transparent)] // SAFETY: must stay layout-compatible with [u8]
pub struct Path {
    inner: [u8],
}

impl Path {
    // SAFETY: the empty path has no components to validate.
    pub const ROOT: &'static Path = unsafe { Path::new_unchecked(&[]) };

    /// # Safety
    /// `bytes` must be empty, or valid components joined by `/`.
    const unsafe fn new_unchecked(bytes: &[u8]) -> &Path {
        // SAFETY: Path is a transparent wrapper around [u8].
        unsafe { std::mem::transmute(bytes) }
    }

    fn parse(bytes: &[u8]) -> Result<&Path, PathComponentError> {
        if !bytes.is_empty() {
            for name in bytes.split_str("/") {
                component::validate_name(name)?;
            }
        }
        // SAFETY: validated above.
        Ok(unsafe { Path::new_unchecked(bytes) })
    }

    /// The path without its last component. `None` only for [Path::ROOT].
    pub fn parent(&self) -> Option<&Path> {
        if self.inner.is_empty() {
            return None;
        }
        let parent = match self.inner.rsplit_once_str("/") {
            Some((parent, _)) => parent,
            None => &[],
        };
        // SAFETY: a prefix ending before a separator is a valid path.
        Some(unsafe { Path::new_unchecked(parent) })
    }

    pub fn join(&self, name: &PathComponent) -> PathBuf {
        let mut path = self.to_owned();
        path.push(name);
        path
    }

    /// The components of the path, none for [Path::ROOT].
    pub fn components(&self) -> impl Iterator<Item = PathComponent> + '_ {
        self.components_bytes().map(|name| PathComponent {
            inner: bytes::Bytes::copy_from_slice(name),
        })
    }

    pub fn components_bytes(&self) -> impl Iterator<Item = &[u8]> {
        let mut parts = self.inner.split_str("/");
        if self.inner.is_empty() {
            // splitting "" yields one empty part
            parts.next();
        }
        parts
    }

    pub fn file_name(&self) -> Option<PathComponent> {
        self.components().last()
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self.inner.as_bstr(), f)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self.inner.as_bstr(), f)
    }
}

impl AsRef<Path> for Path {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl ToOwned for Path {
    type Owned = PathBuf;

    fn to_owned(&self) -> PathBuf {
        PathBuf {
            inner: self.inner.to_vec(),
        }
    }
}

/// An owned [Path].
#[derive(Clone, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct PathBuf {
    inner: Vec<u8>,
}

impl PathBuf {
    pub fn new() -> PathBuf {
        Self::default()
    }

    pub fn push(&mut self, name: &PathComponent) {
        if !self.inner.is_empty() {
            self.inner.push(b'/');
        }
        self.inner.extend_from_slice(name.as_ref());
    }

    /// Converts a relative host path, such as one below an imported
    /// directory. `.` parts are skipped. Absolute paths, `..` and names
    /// that aren't UTF-8 are rejected.
    pub fn from_host_path(host_path: &std::path::Path) -> Result<PathBuf, crate::Error> {
        let invalid = || crate::Error::InvalidPath(host_path.display().to_string());

        let mut path = PathBuf::new();
        for part in host_path.components() {
            match part {
                std::path::Component::CurDir => {}
                std::path::Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(invalid)?;
                    path.push(&PathComponent::try_from(name)?);
                }
                _ => return Err(invalid()),
            }
        }
        Ok(path)
    }
}

impl Deref for PathBuf {
    type Target = Path;

    fn deref(&self) -> &Path {
        // SAFETY: only ever built from valid components.
        unsafe { Path::new_unchecked(&self.inner) }
    }
}

impl AsRef<Path> for PathBuf {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl Borrow<Path> for PathBuf {
    fn borrow(&self) -> &Path {
        self
    }
}

impl From<&Path> for PathBuf {
    fn from(value: &Path) -> Self {
        value.to_owned()
    }
}

impl From<PathComponent> for PathBuf {
    fn from(value: PathComponent) -> Self {
        PathBuf {
            inner: value.inner.to_vec(),
        }
    }
}

impl FromStr for PathBuf {
    type Err = PathComponentError;

    fn from_str(s: &str) -> Result<PathBuf, Self::Err> {
        Ok(Path::parse(s.as_bytes())?.to_owned())
    }
}

impl fmt::Debug for PathBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl fmt::Display for PathBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::{Path, PathBuf};
    use crate::Error;
    use rstest::rstest;

    #[rstest]
    #[case::root("", &[])]
    #[case::single("a.txt", &["a.txt"])]
    #[case::nested("web/WEB-INF/web.xml", &["web", "WEB-INF", "web.xml"])]
    fn components(#[case] s: &str, #[case] names: &[&str]) {
        let path: PathBuf = s.parse().expect("must parse");
        let parsed: Vec<String> = path.components().map(|c| c.to_string()).collect();
        assert_eq!(names, parsed);
        assert_eq!(s, path.to_string());
    }

    #[rstest]
    #[case::absolute("/a")]
    #[case::double_slash("a//b")]
    #[case::trailing_slash("a/")]
    #[case::dotdot("a/../b")]
    #[case::nul("a\0")]
    fn invalid(#[case] s: &str) {
        assert!(s.parse::<PathBuf>().is_err());
    }

    #[rstest]
    #[case::file("a.txt", "")]
    #[case::nested("a/b/c.txt", "a/b")]
    fn parent(#[case] path: PathBuf, #[case] expected_parent: PathBuf) {
        assert_eq!(Some(&*expected_parent), path.parent());
        assert_eq!(None, Path::ROOT.parent());
    }

    #[test]
    fn join() {
        let dir: PathBuf = "lib".parse().unwrap();
        let path = dir.join(&"a.jar".try_into().unwrap());
        assert_eq!("lib/a.jar", path.to_string());
        assert_eq!("a.jar", Path::ROOT.join(&"a.jar".try_into().unwrap()).to_string());
        assert_eq!(Some("a.jar".try_into().unwrap()), path.file_name());
    }

    #[rstest]
    #[case::plain("assets/css/main.css", "assets/css/main.css")]
    #[case::cur_dir("./assets/./logo.svg", "assets/logo.svg")]
    fn from_host_path(#[case] host: &str, #[case] expected: PathBuf) {
        assert_eq!(
            expected,
            PathBuf::from_host_path(std::path::Path::new(host)).expect("must convert")
        );
    }

    #[rstest]
    #[case::absolute("/etc/passwd")]
    #[case::parent("../a")]
    fn from_host_path_invalid(#[case] host: &str) {
        assert!(matches!(
            PathBuf::from_host_path(std::path::Path::new(host)),
            Err(Error::InvalidPath(_))
        ));
    }
}
