//! Archive wire format, without I/O details.
//!
//! The format is a stripped down NAR: an S-expression encoded onto the wire
//! with the same rules, but without symlinks or an executable bit.
//!
//! # Encoding
//!
//! Lengths are represented as 64-bit unsigned integers in little-endian
//! format. Byte strings, including file contents and syntactic strings
//! part of the grammar, are prefixed by their 64-bit length, and padded
//! to 8-byte (64-bit) alignment with zero bytes.
//!
//! # Grammar
//!
//! ```plain
//! archive ::= "stage-archive-1" node
//!
//! node ::= "(" "type" "regular" "contents" string ")"
//!      ||= "(" "type" "directory" entry* ")"
//!
//! entry ::= "entry" "(" "name" string "node" node ")"
//! ```
//!
//! Pulling together the purely syntactic elements into tokens:
//! ```plain
//! archive ::= TOK_ARC node
//! node ::= TOK_REG string TOK_PAR
//!      ||= TOK_DIR entry* TOK_PAR
//!
//! entry ::= TOK_ENT string TOK_NOD node TOK_PAR
//!
//! TOK_ARC ::= "stage-archive-1" "(" "type"
//! TOK_REG ::= "regular" "contents"
//! TOK_DIR ::= "directory"
//! TOK_ENT ::= "entry" "(" "name"
//! TOK_NOD ::= "node" "(" "type"
//! TOK_PAR ::= ")"
//! ```
//!
//! Where the grammar offers a choice ([TOK_REG] or [TOK_DIR] after a node
//! opens, [TOK_ENT] or [TOK_PAR] inside a directory), the candidates
//! already differ in the length word of their first string.
//!
//! # Restrictions
//!
//! Unlike NAR, directory entries keep the order they were written in.
//! Entry names must be valid [stage_vfs::path::PathComponent]s, and must be
//! unique within a directory. Both the [super::reader] and the
//! [super::writer] enforce this.

pub use stage_vfs::path::MAX_NAME_LEN;

pub const TOK_ARC: [u8; 56] = *b"\x0f\0\0\0\0\0\0\0stage-archive-1\0\x01\0\0\0\0\0\0\0(\0\0\0\0\0\0\0\x04\0\0\0\0\0\0\0type\0\0\0\0";
pub const TOK_REG: [u8; 32] = *b"\x07\0\0\0\0\0\0\0regular\0\x08\0\0\0\0\0\0\0contents";
pub const TOK_DIR: [u8; 24] = *b"\x09\0\0\0\0\0\0\0directory\0\0\0\0\0\0\0";
pub const TOK_ENT: [u8; 48] = *b"\x05\0\0\0\0\0\0\0entry\0\0\0\x01\0\0\0\0\0\0\0(\0\0\0\0\0\0\0\x04\0\0\0\0\0\0\0name\0\0\0\0";
pub const TOK_NOD: [u8; 48] = *b"\x04\0\0\0\0\0\0\0node\0\0\0\0\x01\0\0\0\0\0\0\0(\0\0\0\0\0\0\0\x04\0\0\0\0\0\0\0type\0\0\0\0";
pub const TOK_PAR: [u8; 16] = *b"\x01\0\0\0\0\0\0\0)\0\0\0\0\0\0\0";
