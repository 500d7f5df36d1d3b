//! Helpers for reading [crate::wire] format.

use std::io::{self, ErrorKind::InvalidData, Read};

use super::Reader;

/// Consume a little-endian [u64] from the reader.
pub fn u64(reader: &mut Reader) -> io::Result<u64> {
    let mut buf = [0; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Consume a byte string of up to `max_len` bytes, without its padding.
pub fn bytes(reader: &mut Reader, max_len: usize) -> io::Result<Vec<u8>> {
    let len = self::u64(reader)?;
    if len > max_len as u64 {
        return Err(io::Error::new(InvalidData, "string too long"));
    }

    let mut buf = vec![0; len as usize];
    reader.read_exact(&mut buf)?;
    padding(reader, len)?;
    Ok(buf)
}

/// Consume the zero padding following a byte string of length `len`.
pub fn padding(reader: &mut Reader, len: u64) -> io::Result<()> {
    let used = (len % 8) as usize;
    if used == 0 {
        return Ok(());
    }

    let mut buf = [0; 8];
    reader.read_exact(&mut buf[used..])?;
    if buf != [0; 8] {
        return Err(io::Error::new(InvalidData, "non-zero padding"));
    }
    Ok(())
}

/// Consume exactly `token`, failing at the first 64-bit word that differs.
pub fn token(reader: &mut Reader, token: &[u8]) -> io::Result<()> {
    let mut buf = [0; 8];
    for word in token.chunks(8) {
        let buf = &mut buf[..word.len()];
        reader.read_exact(buf)?;
        if buf != word {
            return Err(io::Error::new(InvalidData, "unexpected token"));
        }
    }
    Ok(())
}

/// Consume whichever of `tokens` comes next and return its index. The
/// candidates are told apart by their leading length word.
pub fn one_of(reader: &mut Reader, tokens: &[&[u8]]) -> io::Result<usize> {
    let mut len = [0; 8];
    reader.read_exact(&mut len)?;

    let i = tokens
        .iter()
        .position(|t| t[..8] == len)
        .ok_or_else(|| io::Error::new(InvalidData, "unexpected token"))?;
    token(reader, &tokens[i][8..])?;
    Ok(i)
}
