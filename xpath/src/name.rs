//! Names as written in an expression, and their expanded form.

use smol_str::SmolStr;
use std::fmt;

use crate::Error;

/// A name in its expanded form: namespace URI plus local part.
///
/// Names without a namespace have an empty URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace: SmolStr,
    pub local: SmolStr,
}

impl QName {
    pub fn new(namespace: impl Into<SmolStr>, local: impl Into<SmolStr>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    pub fn local(local: impl Into<SmolStr>) -> Self {
        Self::new("", local)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// A name as written: an optional prefix and a local part, `prefix:local`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrefixedName {
    prefix: Option<SmolStr>,
    local: SmolStr,
}

impl PrefixedName {
    /// Parses `local` or `prefix:local`. Both parts must be NCNames.
    pub fn parse(name: &str) -> Result<Self, Error> {
        let (prefix, local) = match name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, name),
        };

        if !prefix.map_or(true, is_ncname) || !is_ncname(local) {
            return Err(Error::InvalidName(name.to_owned()));
        }

        Ok(Self {
            prefix: prefix.map(SmolStr::from),
            local: local.into(),
        })
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Returns a copy with the local part replaced.
    pub(crate) fn with_local(&self, local: SmolStr) -> Self {
        Self {
            prefix: self.prefix.clone(),
            local,
        }
    }
}

impl fmt::Display for PrefixedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Checks whether `s` is a non-colonized name.
pub(crate) fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
