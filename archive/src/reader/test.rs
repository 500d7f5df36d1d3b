use hex_literal::hex;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::ErrorKind;

use crate::{reader, wire, Member};

/// Encodes a byte string the way the wire format does.
fn string(s: &[u8]) -> Vec<u8> {
    let mut out = (s.len() as u64).to_le_bytes().to_vec();
    out.extend_from_slice(s);
    out.resize(out.len() + (8 - s.len() % 8) % 8, 0);
    out
}

fn entry(name: &[u8], node: &[u8]) -> Vec<u8> {
    [&wire::TOK_ENT[..], &string(name), &wire::TOK_NOD, node, &wire::TOK_PAR].concat()
}

fn reg(content: &[u8]) -> Vec<u8> {
    [&wire::TOK_REG[..], &string(content), &wire::TOK_PAR].concat()
}

fn dir(entries: &[Vec<u8>]) -> Vec<u8> {
    [&wire::TOK_DIR[..], &entries.concat(), &wire::TOK_PAR].concat()
}

fn archive(root: &[u8]) -> Vec<u8> {
    [&wire::TOK_ARC[..], root].concat()
}

#[test]
fn string_padding() {
    assert_eq!(
        hex!("0500000000000000 68656c6c6f000000").to_vec(),
        string(b"hello")
    );
    assert_eq!(
        hex!("0800000000000000 3132333435363738").to_vec(),
        string(b"12345678")
    );
    assert_eq!(hex!("0000000000000000").to_vec(), string(b""));
}

#[test]
fn single_file() {
    let data = archive(&dir(&[entry(b"hello.txt", &reg(b"Hello World!"))]));
    assert_eq!(
        vec![Member::file("hello.txt".try_into().unwrap(), "Hello World!")],
        reader::open(&mut &data[..]).unwrap()
    );
}

#[test]
fn keeps_written_order() {
    let data = archive(&dir(&[
        entry(b"z", &reg(b"")),
        entry(b"a", &dir(&[entry(b"m", &reg(b"12345678"))])),
    ]));
    let members = reader::open(&mut &data[..]).unwrap();
    assert_eq!(
        vec![
            Member::file("z".try_into().unwrap(), ""),
            Member::directory(
                "a".try_into().unwrap(),
                vec![Member::file("m".try_into().unwrap(), "12345678")]
            ),
        ],
        members
    );
}

#[test]
fn matches_writer() {
    let data = archive(&dir(&[entry(b"hello.txt", &reg(b"Hello World!"))]));

    let mut buf = vec![];
    crate::writer::open(&mut buf)
        .unwrap()
        .members(&[Member::file(
            "hello.txt".try_into().unwrap(),
            "Hello World!",
        )])
        .unwrap();

    assert_eq!(data, buf);
}

#[rstest]
#[case::root_is_file(archive(&reg(b"x")))]
#[case::duplicate_names(archive(&dir(&[entry(b"a", &reg(b"1")), entry(b"a", &reg(b"2"))])))]
#[case::dot(archive(&dir(&[entry(b".", &reg(b"1"))])))]
#[case::dotdot(archive(&dir(&[entry(b"..", &reg(b"1"))])))]
#[case::slash(archive(&dir(&[entry(b"a/b", &reg(b"1"))])))]
#[case::empty_name(archive(&dir(&[entry(b"", &reg(b"1"))])))]
#[case::symlink(archive(&[&string(b"symlink")[..], &string(b"target")].concat()))]
#[case::unknown_node(archive(&[&string(b"executable")[..], &wire::TOK_PAR].concat()))]
#[case::trailing_data([archive(&dir(&[])), vec![0; 8]].concat())]
#[case::bad_magic([&b"\x0f\0\0\0\0\0\0\0nix-archive-1\0\0\0"[..], &dir(&[])].concat())]
fn invalid_data(#[case] data: Vec<u8>) {
    let err = reader::open(&mut &data[..]).expect_err("must fail");
    assert_eq!(ErrorKind::InvalidData, err.kind());
}

#[test]
fn bad_padding() {
    let mut data = archive(&dir(&[entry(b"a", &reg(b"x"))]));
    // the padding byte right after the file content
    let pos = wire::TOK_ARC.len()
        + wire::TOK_DIR.len()
        + wire::TOK_ENT.len()
        + 16
        + wire::TOK_NOD.len()
        + wire::TOK_REG.len()
        + 8
        + 1;
    data[pos] = 1;
    let err = reader::open(&mut &data[..]).expect_err("must fail");
    assert_eq!(ErrorKind::InvalidData, err.kind());
}

#[test]
fn truncated() {
    let data = archive(&dir(&[entry(b"a", &reg(b"some content"))]));
    for len in [0, 10, wire::TOK_ARC.len() + 30, data.len() - 1] {
        let err = reader::open(&mut &data[..len]).expect_err("must fail");
        assert!(
            matches!(err.kind(), ErrorKind::UnexpectedEof | ErrorKind::InvalidData),
            "unexpected error for len {len}: {err}"
        );
    }
}
