//! Binary encode/decode primitives for the blob format.
//!
//! All integers are little-endian. Arrays and strings are prefixed with a
//! `u32` element count, optional values and references with a presence
//! byte. There is no padding and no self-describing schema: the field
//! order of each descriptor is fixed by its canonical walk.

use petrify_core::{Category, CategorySet, ContentHash, FormatError};

use crate::{FORMAT_VERSION, MAGIC};

// ── Primitive writers ───────────────────────────────────────────

/// Append a single byte.
pub fn write_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

/// Append a little-endian u32.
pub fn write_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian u64.
pub fn write_u64_le(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

// ── Framing ─────────────────────────────────────────────────────

/// Append the blob header (magic and format version).
pub fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(&MAGIC);
    write_u32_le(out, FORMAT_VERSION);
}

/// Byte size of the fixed part of a framed record.
pub const RECORD_HEADER_LEN: usize = 8 + 1 + 4;

/// Append one framed record: hash, dependency mask, payload length, payload.
///
/// The caller guarantees `payload.len()` fits in a `u32`.
pub fn write_record(out: &mut Vec<u8>, hash: ContentHash, deps: CategorySet, payload: &[u8]) {
    write_u64_le(out, hash.0);
    write_u8(out, deps.bits());
    write_u32_le(out, payload.len() as u32);
    out.extend_from_slice(payload);
}

/// Check the blob header and leave `r` positioned after it.
pub fn read_header(r: &mut WireReader<'_>) -> Result<(), FormatError> {
    let magic = r.take(MAGIC.len()).map_err(|_| FormatError::InvalidMagic)?;
    if magic != MAGIC {
        return Err(FormatError::InvalidMagic);
    }
    let found = r.u32()?;
    if found != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion { found });
    }
    Ok(())
}

// ── Reader ──────────────────────────────────────────────────────

/// Bounds-checked cursor over a byte slice.
///
/// Every read either returns a complete value or a
/// [`FormatError::Truncated`]; nothing reads past the end.
#[derive(Clone, Debug)]
pub struct WireReader<'b> {
    buf: &'b [u8],
    pos: usize,
}

impl<'b> WireReader<'b> {
    /// Start reading at the beginning of `buf`.
    pub fn new(buf: &'b [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Consume the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'b [u8], FormatError> {
        if n > self.remaining() {
            return Err(FormatError::Truncated {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.array::<1>()?[0])
    }

    /// Read a little-endian u32.
    pub fn u32(&mut self) -> Result<u32, FormatError> {
        self.array().map(u32::from_le_bytes)
    }

    /// Read a little-endian i32.
    pub fn i32(&mut self) -> Result<i32, FormatError> {
        self.array().map(i32::from_le_bytes)
    }

    /// Read a little-endian u64.
    pub fn u64(&mut self) -> Result<u64, FormatError> {
        self.array().map(u64::from_le_bytes)
    }

    /// Read an f32 stored by bit pattern.
    pub fn f32(&mut self) -> Result<f32, FormatError> {
        self.u32().map(f32::from_bits)
    }

    /// Read a boolean byte; anything but 0 or 1 is rejected.
    pub fn bool(&mut self) -> Result<bool, FormatError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(FormatError::InvalidValue {
                detail: format!("boolean byte {b}"),
            }),
        }
    }

    /// Read the presence byte of an optional value or reference.
    pub fn presence(&mut self) -> Result<bool, FormatError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(FormatError::InvalidValue {
                detail: format!("presence tag {b}"),
            }),
        }
    }

    /// Read an element count and check that `count * min_elem_size`
    /// bytes could still follow.
    ///
    /// Decoders call this before allocating, so a corrupt count cannot
    /// request more memory than the blob could describe.
    pub fn count(&mut self, min_elem_size: usize) -> Result<usize, FormatError> {
        let count = self.u32()? as usize;
        let needed = count.saturating_mul(min_elem_size);
        if needed > self.remaining() {
            return Err(FormatError::Truncated {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    /// Read a length-prefixed byte string.
    pub fn bytes(&mut self) -> Result<&'b [u8], FormatError> {
        let len = self.count(1)?;
        self.take(len)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn str(&mut self) -> Result<&'b str, FormatError> {
        let bytes = self.bytes()?;
        std::str::from_utf8(bytes).map_err(|e| FormatError::InvalidValue {
            detail: format!("invalid UTF-8 string: {e}"),
        })
    }

    /// Read a category tag.
    pub fn category(&mut self) -> Result<Category, FormatError> {
        let tag = self.u8()?;
        Category::from_u8(tag).ok_or_else(|| FormatError::InvalidValue {
            detail: format!("category tag {tag}"),
        })
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self) -> Result<(), FormatError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(FormatError::TrailingBytes { remaining }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let mut out = Vec::new();
        write_header(&mut out);
        let mut r = WireReader::new(&out);
        read_header(&mut r).unwrap();
        assert!(r.finish().is_ok());
    }

    #[test]
    fn bad_magic_and_version() {
        let mut r = WireReader::new(b"NOPE\x01\x00\x00\x00");
        assert_eq!(read_header(&mut r), Err(FormatError::InvalidMagic));

        let mut r = WireReader::new(b"PT");
        assert_eq!(read_header(&mut r), Err(FormatError::InvalidMagic));

        let mut out = MAGIC.to_vec();
        write_u32_le(&mut out, FORMAT_VERSION + 1);
        let mut r = WireReader::new(&out);
        assert_eq!(
            read_header(&mut r),
            Err(FormatError::UnsupportedVersion {
                found: FORMAT_VERSION + 1
            })
        );
    }

    #[test]
    fn truncated_read_reports_sizes() {
        let mut r = WireReader::new(&[1, 2, 3]);
        assert_eq!(
            r.u32(),
            Err(FormatError::Truncated {
                needed: 4,
                remaining: 3
            })
        );
        // A failed read consumes nothing.
        assert_eq!(r.remaining(), 3);
    }

    #[test]
    fn bool_and_presence_reject_other_bytes() {
        let mut r = WireReader::new(&[0, 1, 2]);
        assert_eq!(r.bool(), Ok(false));
        assert_eq!(r.bool(), Ok(true));
        assert!(matches!(r.bool(), Err(FormatError::InvalidValue { .. })));

        let mut r = WireReader::new(&[7]);
        assert!(matches!(r.presence(), Err(FormatError::InvalidValue { .. })));
    }

    #[test]
    fn len_is_bounded_by_remaining_bytes() {
        let mut out = Vec::new();
        write_u32_le(&mut out, u32::MAX);
        out.extend_from_slice(&[0; 8]);
        let mut r = WireReader::new(&out);
        assert!(matches!(r.count(4), Err(FormatError::Truncated { .. })));

        let mut out = Vec::new();
        write_u32_le(&mut out, 2);
        out.extend_from_slice(&[0; 8]);
        let mut r = WireReader::new(&out);
        assert_eq!(r.count(4), Ok(2));
    }

    #[test]
    fn str_rejects_invalid_utf8() {
        let mut out = Vec::new();
        write_u32_le(&mut out, 2);
        out.extend_from_slice(&[0xC3, 0x28]);
        let mut r = WireReader::new(&out);
        assert!(matches!(r.str(), Err(FormatError::InvalidValue { .. })));
    }

    #[test]
    fn record_framing() {
        let mut out = Vec::new();
        let deps = CategorySet::of(&[Category::Sampler]);
        write_record(&mut out, ContentHash(0x1122), deps, &[9, 8, 7]);
        assert_eq!(out.len(), RECORD_HEADER_LEN + 3);

        let mut r = WireReader::new(&out);
        assert_eq!(r.u64(), Ok(0x1122));
        assert_eq!(r.u8(), Ok(deps.bits()));
        assert_eq!(r.count(1), Ok(3));
        assert_eq!(r.take(3), Ok(&[9u8, 8, 7][..]));
        assert!(r.finish().is_ok());
    }

    #[test]
    fn trailing_bytes_detected() {
        let r = WireReader::new(&[0, 0]);
        assert_eq!(r.finish(), Err(FormatError::TrailingBytes { remaining: 2 }));
    }
}
