use lazy_static::lazy_static;

use crate::digest::B3Digest;

pub const TEXT: &[u8] = b"text";
pub const NEW_TEXT: &[u8] = b"new text";
pub const EMPTY_CONTENTS: &[u8] = b"";

/// A manifest with an archive, a copied directory and an included artifact.
/// Needs `conf/web.xml` and the directory `static` to exist.
pub const MANIFEST_JSON: &str = r#"{
  "config": { "compression": { "type": "zstd", "level": 3 } },
  "artifacts": {
    "web": [
      { "type": "archive", "name": "web.war", "children": [
        { "type": "dir", "name": "WEB-INF", "children": [
          { "type": "file", "path": "conf/web.xml" }
        ] },
        { "type": "dir_copy", "path": "static" }
      ] }
    ],
    "app": [{ "type": "artifact", "name": "web" }]
  }
}"#;

lazy_static! {
    pub static ref TEXT_DIGEST: B3Digest = B3Digest::of(TEXT);
    pub static ref NEW_TEXT_DIGEST: B3Digest = B3Digest::of(NEW_TEXT);
    pub static ref EMPTY_DIGEST: B3Digest = B3Digest::of(EMPTY_CONTENTS);
}
