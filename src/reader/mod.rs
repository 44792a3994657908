#![doc = r#"
Bounds-checked cursor over a raw SMF byte buffer

All primitive reads the decoder needs live here: single bytes, big-endian
fixed-width integers, 4-character chunk tags, and variable-length
quantities. Every read checks the remaining buffer and fails with
[`DecodeError::OutOfBounds`] carrying the offending offset, so the decode
loop never indexes past the input.
"#]

mod error;
pub use error::*;

/// A read cursor over an immutable byte buffer.
///
/// Scoped to a single decode call; position only ever moves forward.
#[derive(Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader at the start of `bytes`.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Current read offset from the start of the buffer.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Total buffer length.
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if no bytes remain.
    pub const fn is_empty(&self) -> bool {
        self.position >= self.bytes.len()
    }

    /// Next byte without consuming it.
    pub fn peek_u8(&self) -> DecodeResult<u8> {
        match self.bytes.get(self.position) {
            Some(b) => Ok(*b),
            None => Err(DecodeError::OutOfBounds(self.position)),
        }
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        let b = self.peek_u8()?;
        self.position += 1;
        Ok(b)
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        let bytes = self.read_exact::<2>()?;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        let bytes = self.read_exact::<4>()?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// Reads a 4-character chunk tag (`MThd`, `MTrk`, ...).
    pub fn read_tag(&mut self) -> DecodeResult<[u8; 4]> {
        self.read_exact::<4>()
    }

    /// Reads `len` raw bytes as a slice into the buffer.
    pub fn read_bytes(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .ok_or(DecodeError::OutOfBounds(self.position))?;
        if end > self.bytes.len() {
            return Err(DecodeError::OutOfBounds(self.position));
        }
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    /// Advances the cursor by `len` bytes, discarding them.
    pub fn skip(&mut self, len: usize) -> DecodeResult<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Moves the cursor to an absolute offset. Used to jump to a chunk's
    /// declared end after EndOfTrack.
    pub fn seek(&mut self, position: usize) -> DecodeResult<()> {
        if position > self.bytes.len() {
            return Err(DecodeError::OutOfBounds(position));
        }
        self.position = position;
        Ok(())
    }

    /// Reads a variable-length quantity (see [`crate::vlq`]).
    ///
    /// No upper bound is enforced on the group count; the caller bounds the
    /// read by scanning only within a chunk's declared length.
    pub fn read_vlq(&mut self) -> DecodeResult<u32> {
        let mut value: u32 = 0;
        loop {
            let byte = self.read_u8()?;
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
    }

    fn read_exact<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let slice = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_reads() {
        let mut reader = Reader::new(&[0x01, 0xE0, 0x00, 0x00, 0x00, 0x06, 0x2A]);
        assert_eq!(reader.read_u16().unwrap(), 480);
        assert_eq!(reader.read_u32().unwrap(), 6);
        assert_eq!(reader.read_u8().unwrap(), 0x2A);
        assert!(reader.is_empty());
    }

    #[test]
    fn out_of_bounds_reports_offset() {
        let mut reader = Reader::new(&[0x00, 0x01]);
        reader.read_u8().unwrap();
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(err, DecodeError::OutOfBounds(1)));
    }

    #[test]
    fn vlq_multi_byte() {
        let mut reader = Reader::new(&[0x81, 0x80, 0x00, 0x7F]);
        assert_eq!(reader.read_vlq().unwrap(), 0x4000);
        assert_eq!(reader.read_vlq().unwrap(), 0x7F);
    }

    #[test]
    fn vlq_truncated_is_out_of_bounds() {
        let mut reader = Reader::new(&[0xFF, 0xFF]);
        assert!(reader.read_vlq().is_err());
    }
}
