//! Forward-reading byte cursor over an owned buffer.
//!
//! Chunk payloads are copied out of the file buffer into per-chunk cursors,
//! so a cursor always owns its backing storage. Typed reads are
//! little-endian; the columnar readers in `codec` gather their big-endian
//! lanes through `peek` and advance with a single `skip`.

use crate::error::{Error, Result};
use std::path::Path;

/// First four bytes of a zstd frame (RFC 8878, 3.1.1)
const ZSTD_FRAME_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Decompress `src` into a buffer of exactly `expected_len` bytes.
///
/// The algorithm is selected by sniffing the zstd frame magic; anything else
/// is treated as a raw LZ4 block. A size disagreement between the decoder
/// output and `expected_len` is a corrupt payload.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let out = if src.len() > 4 && src[..4] == ZSTD_FRAME_MAGIC {
        zstd::bulk::decompress(src, expected_len)
            .map_err(|e| Error::corrupt(format!("zstd decompression failed: {e}")))?
    } else {
        lz4::block::decompress(src, Some(expected_len as i32))
            .map_err(|e| Error::corrupt(format!("lz4 decompression failed: {e}")))?
    };

    if out.len() != expected_len {
        return Err(Error::corrupt(format!(
            "decompressed {} bytes, chunk header declared {}",
            out.len(),
            expected_len
        )));
    }
    Ok(out)
}

/// A bounds-checked reading view over an owned byte buffer.
pub struct ByteCursor {
    buf: Vec<u8>,
    offset: usize,
}

impl ByteCursor {
    /// Empty cursor, for zero-length chunk payloads.
    pub fn empty() -> Self {
        Self::from_bytes(Vec::new())
    }

    /// Take ownership of an in-memory buffer.
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Self { buf, offset: 0 }
    }

    /// Load an entire file into a cursor.
    pub fn from_file(path: &Path) -> Result<Self> {
        let buf = std::fs::read(path)?;
        Ok(Self { buf, offset: 0 })
    }

    /// Consume `len` bytes from `other` into a fresh cursor.
    pub fn from_cursor(other: &mut ByteCursor, len: usize) -> Result<Self> {
        let buf = other.view(len)?.to_vec();
        other.skip(len)?;
        Ok(Self { buf, offset: 0 })
    }

    /// Decompress a payload of known uncompressed length into a fresh cursor.
    pub fn from_compressed(src: &[u8], expected_len: usize) -> Result<Self> {
        Ok(Self::from_bytes(decompress(src, expected_len)?))
    }

    /// Total size of the backing buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Current read offset.
    pub fn tell(&self) -> usize {
        self.offset
    }

    /// Byte at an absolute offset, independent of the read position.
    pub fn peek(&self, offset: usize) -> Result<u8> {
        self.buf
            .get(offset)
            .copied()
            .ok_or(Error::Truncated { offset, needed: 1 })
    }

    /// Borrow `len` bytes at the current offset without advancing.
    pub fn view(&self, len: usize) -> Result<&[u8]> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(Error::Truncated { offset: self.offset, needed: len })?;
        self.buf
            .get(self.offset..end)
            .ok_or(Error::Truncated { offset: self.offset, needed: len })
    }

    /// Advance the read offset by `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.view(n)?;
        self.offset += n;
        Ok(())
    }

    /// Copy bytes into `dest` and advance.
    pub fn read_into(&mut self, dest: &mut [u8]) -> Result<()> {
        dest.copy_from_slice(self.view(dest.len())?);
        self.offset += dest.len();
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        self.read_into(&mut out)?;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }
}
