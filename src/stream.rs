use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{ErrorKind, Read, Write};

/// A 4-byte ASCII chunk tag, written raw with no terminator.
pub(crate) type ChunkTag = [u8; 4];

/// A short read means the stream ended inside a chunk; that is a malformed
/// stream, not an I/O failure.
fn map_eof(err: std::io::Error) -> Error {
    if err.kind() == ErrorKind::UnexpectedEof {
        Error::format("unexpected end of stream")
    } else {
        Error::Io(err)
    }
}

pub(crate) fn write_tag<W: Write>(writer: &mut W, tag: ChunkTag) -> Result<()> {
    writer.write_all(&tag)?;
    Ok(())
}

/// Read the next 4 bytes and require them to be `expected`.
pub(crate) fn expect_tag<R: Read>(reader: &mut R, expected: ChunkTag) -> Result<()> {
    let mut tag = [0u8; 4];
    read_exact(reader, &mut tag)?;
    if tag != expected {
        return Err(Error::format_dynamic(format!(
            "expected {} chunk, found {}",
            String::from_utf8_lossy(&expected),
            String::from_utf8_lossy(&tag)
        )));
    }
    Ok(())
}

pub(crate) fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_u32::<LittleEndian>(value)?;
    Ok(())
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    reader.read_u32::<LittleEndian>().map_err(map_eof)
}

pub(crate) fn write_f32<W: Write>(writer: &mut W, value: f32) -> Result<()> {
    writer.write_f32::<LittleEndian>(value)?;
    Ok(())
}

pub(crate) fn read_f32<R: Read>(reader: &mut R) -> Result<f32> {
    reader.read_f32::<LittleEndian>().map_err(map_eof)
}

pub(crate) fn read_exact<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<()> {
    reader.read_exact(buffer).map_err(map_eof)
}
