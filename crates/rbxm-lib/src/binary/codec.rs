//! Primitive numeric transforms and columnar column readers.
//!
//! Integer columns are zig-zag coded; float columns rotate the sign bit into
//! the LSB. Both are stored byte-interleaved: a column of N W-byte values is
//! written as W runs of N bytes, most significant lane first, so that bytes
//! of equal significance sit together for the byte-stream compressor.

use super::cursor::ByteCursor;
use crate::error::Result;

/// Zig-zag decode a 32-bit value: small magnitudes of either sign come from
/// small unsigned codes.
pub fn decode_zigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zig-zag decode a 64-bit value.
pub fn decode_zigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Undo the encoder's left-rotation of the sign bit and bit-cast to f32.
pub fn decode_rotated_f32(value: u32) -> f32 {
    f32::from_bits(value.rotate_right(1))
}

/// Length-prefixed string, lossily decoded as UTF-8.
pub fn read_string(cur: &mut ByteCursor) -> Result<String> {
    let len = cur.read_u32()? as usize;
    let text = String::from_utf8_lossy(cur.view(len)?).into_owned();
    cur.skip(len)?;
    Ok(text)
}

/// Contiguous run of `count` bytes (u8 columns are not interleaved).
pub fn read_u8_run(cur: &mut ByteCursor, count: usize) -> Result<Vec<u8>> {
    let bytes = cur.view(count)?.to_vec();
    cur.skip(count)?;
    Ok(bytes)
}

/// Reassemble element `i` of a 4-byte-wide interleaved column, peeking each
/// lane at its absolute offset.
fn gather4(cur: &ByteCursor, base: usize, count: usize, i: usize) -> Result<u32> {
    Ok((u32::from(cur.peek(base + i)?) << 24)
        | (u32::from(cur.peek(base + count + i)?) << 16)
        | (u32::from(cur.peek(base + 2 * count + i)?) << 8)
        | u32::from(cur.peek(base + 3 * count + i)?))
}

/// Interleaved column of zig-zag i32s. The cursor advances once, by the
/// whole column, after the elements are gathered.
pub fn read_interleaved_i32(cur: &mut ByteCursor, count: usize) -> Result<Vec<i32>> {
    let base = cur.tell();
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        values.push(decode_zigzag32(gather4(cur, base, count, i)?));
    }
    cur.skip(count * 4)?;
    Ok(values)
}

/// Interleaved column of raw u32s (no numeric transform).
pub fn read_interleaved_u32(cur: &mut ByteCursor, count: usize) -> Result<Vec<u32>> {
    let base = cur.tell();
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        values.push(gather4(cur, base, count, i)?);
    }
    cur.skip(count * 4)?;
    Ok(values)
}

/// Interleaved column of rotated floats.
pub fn read_interleaved_f32(cur: &mut ByteCursor, count: usize) -> Result<Vec<f32>> {
    let base = cur.tell();
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        values.push(decode_rotated_f32(gather4(cur, base, count, i)?));
    }
    cur.skip(count * 4)?;
    Ok(values)
}

/// Interleaved column of zig-zag i64s. All eight byte lanes participate in
/// the transpose, mirroring the 4-byte variant.
pub fn read_interleaved_i64(cur: &mut ByteCursor, count: usize) -> Result<Vec<i64>> {
    let base = cur.tell();
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let mut raw = 0u64;
        for lane in 0..8 {
            raw = (raw << 8) | u64::from(cur.peek(base + lane * count + i)?);
        }
        values.push(decode_zigzag64(raw));
    }
    cur.skip(count * 8)?;
    Ok(values)
}

/// Id column: zig-zag i32 deltas restored to absolute ids by a running sum
/// seeded at zero.
pub fn read_id_array(cur: &mut ByteCursor, count: usize) -> Result<Vec<i32>> {
    let mut values = read_interleaved_i32(cur, count)?;
    let mut last = 0i32;
    for v in &mut values {
        last = last.wrapping_add(*v);
        *v = last;
    }
    Ok(values)
}
