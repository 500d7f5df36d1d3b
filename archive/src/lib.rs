//! The archive format packaged archive entries are serialized with.
//!
//! See [wire] for the format description. [writer] streams an archive out,
//! [reader] reads one back into a tree of [Member]s. [encode] and [decode]
//! wrap both, applying (and detecting) optional zstd compression.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{fmt, io, str::FromStr};
use tracing::{instrument, trace};

mod member;
pub mod reader;
pub mod wire;
pub mod writer;

pub use member::{listing, walk, Member};

/// Magic bytes every zstd frame starts with.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Compression applied to serialized archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Compression {
    #[default]
    None,
    Zstd {
        #[serde(default = "default_zstd_level")]
        level: i32,
    },
}

fn default_zstd_level() -> i32 {
    zstd::DEFAULT_COMPRESSION_LEVEL
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid compression '{0}', expected 'none', 'zstd' or 'zstd:<level>'")]
pub struct ParseCompressionError(String);

impl FromStr for Compression {
    type Err = ParseCompressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "none" => Ok(Compression::None),
            None if s == "zstd" => Ok(Compression::Zstd {
                level: default_zstd_level(),
            }),
            Some(("zstd", level)) => level
                .parse()
                .map(|level| Compression::Zstd { level })
                .map_err(|_| ParseCompressionError(s.to_owned())),
            _ => Err(ParseCompressionError(s.to_owned())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Zstd { level } => write!(f, "zstd:{level}"),
        }
    }
}

/// Serializes `members` as the root directory of a new archive.
#[instrument(skip(members), fields(members = members.len()), err)]
pub fn encode(members: &[Member], compression: Compression) -> io::Result<Bytes> {
    let mut buf = Vec::new();
    writer::open(&mut buf)?.members(members)?;
    trace!(len = buf.len(), "serialized archive");

    match compression {
        Compression::None => Ok(buf.into()),
        Compression::Zstd { level } => Ok(zstd::stream::encode_all(&buf[..], level)?.into()),
    }
}

/// Reads the members of an archive, decompressing it first if it is a
/// zstd frame.
#[instrument(skip(data), fields(len = data.len()), err)]
pub fn decode(data: &[u8]) -> io::Result<Vec<Member>> {
    if data.starts_with(&ZSTD_MAGIC) {
        let raw = zstd::stream::decode_all(data)?;
        reader::open(&mut &raw[..])
    } else {
        reader::open(&mut &data[..])
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, Compression, Member, ZSTD_MAGIC};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn members() -> Vec<Member> {
        vec![
            Member::file("b.txt".try_into().unwrap(), "second comes first"),
            Member::directory(
                "sub".try_into().unwrap(),
                vec![Member::file("a.txt".try_into().unwrap(), "")],
            ),
        ]
    }

    #[rstest]
    #[case::none(Compression::None)]
    #[case::zstd(Compression::Zstd { level: 3 })]
    fn encode_decode(#[case] compression: Compression) {
        let bytes = encode(&members(), compression).unwrap();
        assert_eq!(
            compression != Compression::None,
            bytes.starts_with(&ZSTD_MAGIC)
        );
        assert_eq!(members(), decode(&bytes).unwrap());
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode(&members(), Compression::None).unwrap();
        let b = encode(&members(), Compression::None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_archive() {
        let bytes = encode(&[], Compression::None).unwrap();
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn duplicate_members_rejected() {
        let members = vec![
            Member::file("a".try_into().unwrap(), "1"),
            Member::file("a".try_into().unwrap(), "2"),
        ];
        assert!(encode(&members, Compression::None).is_err());
    }

    #[rstest]
    #[case("none", Some(Compression::None))]
    #[case("zstd", Some(Compression::Zstd { level: zstd::DEFAULT_COMPRESSION_LEVEL }))]
    #[case("zstd:19", Some(Compression::Zstd { level: 19 }))]
    #[case("zstd:x", None)]
    #[case("gzip", None)]
    fn parse_compression(#[case] s: &str, #[case] exp: Option<Compression>) {
        assert_eq!(exp, s.parse().ok());
        if let Some(c) = exp {
            assert_eq!(c, c.to_string().parse().unwrap());
        }
    }

    #[test]
    fn compression_serde() {
        let c: Compression = serde_json::from_str(r#"{"type":"zstd","level":5}"#).unwrap();
        assert_eq!(Compression::Zstd { level: 5 }, c);
        let c: Compression = serde_json::from_str(r#"{"type":"none"}"#).unwrap();
        assert_eq!(Compression::None, c);
    }
}
