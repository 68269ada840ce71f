//! Packed-array codec used for every chunk payload.
//!
//! Arrays of 32-bit values are separated by channel (so values of one
//! channel sit next to each other), serialized little-endian, compressed
//! with DEFLATE and framed as a `u32` byte length followed by the compressed
//! bytes. The rest of the codec treats this module as a black box; only the
//! element and channel counts cross the boundary.

use crate::stream;
use crate::{alloc_scratch, Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use miniz_oxide::deflate::compress_to_vec;
use miniz_oxide::inflate::decompress_to_vec_with_limit;
use std::io::{Read, Write};

const COMPRESSION_LEVEL: u8 = 6;

/// Compress an array of `element_count` tuples of `channel_count` signed
/// integers and write it to the stream.
pub fn pack_signed_ints<W: Write>(
    writer: &mut W,
    values: &[i32],
    element_count: usize,
    channel_count: usize,
) -> Result<()> {
    debug_assert_eq!(values.len(), element_count * channel_count);
    let mut bytes = alloc_scratch::<u8>(values.len() * 4, "packed int scratch")?;
    for channel in 0..channel_count {
        for element in 0..element_count {
            let value = values[element * channel_count + channel];
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    write_packed(writer, &bytes)
}

/// Inverse of [`pack_signed_ints`].
pub fn unpack_signed_ints<R: Read>(
    reader: &mut R,
    element_count: usize,
    channel_count: usize,
) -> Result<Vec<i32>> {
    let total = element_count * channel_count;
    let bytes = read_packed(reader, total * 4)?;
    let mut values = alloc_scratch::<i32>(total, "unpacked int array")?;
    values.resize(total, 0);
    for channel in 0..channel_count {
        for element in 0..element_count {
            let offset = (channel * element_count + element) * 4;
            values[element * channel_count + channel] =
                LittleEndian::read_i32(&bytes[offset..offset + 4]);
        }
    }
    Ok(values)
}

/// Compress an array of `element_count` tuples of `channel_count` floats and
/// write it to the stream.
pub fn pack_floats<W: Write>(
    writer: &mut W,
    values: &[f32],
    element_count: usize,
    channel_count: usize,
) -> Result<()> {
    debug_assert_eq!(values.len(), element_count * channel_count);
    let mut bytes = alloc_scratch::<u8>(values.len() * 4, "packed float scratch")?;
    for channel in 0..channel_count {
        for element in 0..element_count {
            let value = values[element * channel_count + channel];
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    write_packed(writer, &bytes)
}

/// Inverse of [`pack_floats`].
pub fn unpack_floats<R: Read>(
    reader: &mut R,
    element_count: usize,
    channel_count: usize,
) -> Result<Vec<f32>> {
    let total = element_count * channel_count;
    let bytes = read_packed(reader, total * 4)?;
    let mut values = alloc_scratch::<f32>(total, "unpacked float array")?;
    values.resize(total, 0.0);
    for channel in 0..channel_count {
        for element in 0..element_count {
            let offset = (channel * element_count + element) * 4;
            values[element * channel_count + channel] =
                LittleEndian::read_f32(&bytes[offset..offset + 4]);
        }
    }
    Ok(values)
}

fn write_packed<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    let packed = compress_to_vec(bytes, COMPRESSION_LEVEL);
    stream::write_u32(writer, packed.len() as u32)?;
    writer.write_all(&packed)?;
    Ok(())
}

fn read_packed<R: Read>(reader: &mut R, expected_len: usize) -> Result<Vec<u8>> {
    let packed_len = stream::read_u32(reader)? as usize;
    let mut packed = alloc_scratch::<u8>(packed_len, "packed payload")?;
    packed.resize(packed_len, 0);
    stream::read_exact(reader, &mut packed)?;

    let bytes = decompress_to_vec_with_limit(&packed, expected_len)
        .map_err(|_| Error::format("corrupt packed payload"))?;
    if bytes.len() != expected_len {
        return Err(Error::format("packed payload has the wrong length"));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn signed_ints_round_trip() {
        let values = [0, -1, 2, i32::MAX, i32::MIN, 7, -40_000, 40_000, 0];
        for channel_count in [1, 3] {
            let mut buffer = Vec::new();
            pack_signed_ints(
                &mut buffer,
                &values,
                values.len() / channel_count,
                channel_count,
            )
            .unwrap();
            let unpacked = unpack_signed_ints(
                &mut Cursor::new(buffer),
                values.len() / channel_count,
                channel_count,
            )
            .unwrap();
            assert_eq!(unpacked, values);
        }
    }

    #[test]
    fn floats_round_trip() {
        let values = [0.0f32, -1.25, 3.5e-4, 1.0e20, -0.0, f32::MIN_POSITIVE];
        for channel_count in [1, 2, 3] {
            let mut buffer = Vec::new();
            pack_floats(
                &mut buffer,
                &values,
                values.len() / channel_count,
                channel_count,
            )
            .unwrap();
            let unpacked = unpack_floats(
                &mut Cursor::new(buffer),
                values.len() / channel_count,
                channel_count,
            )
            .unwrap();
            assert_eq!(unpacked, values);
        }
    }

    #[test]
    fn repetitive_data_actually_compresses() {
        let values = vec![5i32; 4096];
        let mut buffer = Vec::new();
        pack_signed_ints(&mut buffer, &values, values.len(), 1).unwrap();
        assert!(buffer.len() < values.len() * 4 / 10);
    }

    #[test]
    fn corrupt_payload_is_a_format_error() {
        let values = [1, 2, 3, 4];
        let mut buffer = Vec::new();
        pack_signed_ints(&mut buffer, &values, 4, 1).unwrap();

        // Stomp the compressed body; 0xff encodes an invalid block type.
        for byte in &mut buffer[4..] {
            *byte = 0xff;
        }
        let result = unpack_signed_ints(&mut Cursor::new(buffer), 4, 1);
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn wrong_element_count_is_a_format_error() {
        let values = [1, 2, 3, 4];
        let mut buffer = Vec::new();
        pack_signed_ints(&mut buffer, &values, 4, 1).unwrap();

        let result = unpack_signed_ints(&mut Cursor::new(buffer), 8, 1);
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn truncated_frame_is_a_format_error() {
        let values = [1, 2, 3, 4];
        let mut buffer = Vec::new();
        pack_signed_ints(&mut buffer, &values, 4, 1).unwrap();

        buffer.truncate(buffer.len() / 2);
        let result = unpack_signed_ints(&mut Cursor::new(buffer), 4, 1);
        assert!(matches!(result, Err(Error::Format(_))));
    }
}
