use crate::reader::{DecodeError, DecodeResult, Reader};

#[doc = r#"
The `MThd` header chunk: format, declared track count, and time division.

Only tick-based (PPQN) division is supported. Files declaring SMPTE frame
division, and files declaring format 2, are rejected outright — they have
no sensible mapping onto a tempo-map driven editor timeline.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    format: Format,
    num_tracks: u16,
    ppqn: u16,
}

impl Header {
    /// Creates a header. `ppqn` keeps only its low 15 bits, matching the
    /// wire encoding where the top bit selects SMPTE division.
    pub const fn new(format: Format, num_tracks: u16, ppqn: u16) -> Self {
        Self {
            format,
            num_tracks,
            ppqn: ppqn & 0x7FFF,
        }
    }

    /// The file format.
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Track count declared by the header.
    pub const fn num_tracks(&self) -> u16 {
        self.num_tracks
    }

    /// Ticks per quarter note, 1-32767.
    pub const fn ppqn(&self) -> u16 {
        self.ppqn
    }

    /// Parses and validates the 14-byte header chunk. Each check is fatal,
    /// in order: tag, declared length, format, time division.
    pub(crate) fn read(reader: &mut Reader<'_>) -> DecodeResult<Self> {
        let tag_offset = reader.position();
        let tag = reader.read_tag()?;
        if &tag != b"MThd" {
            return Err(DecodeError::BadChunkTag {
                expected: "MThd",
                found: tag,
                offset: tag_offset,
            });
        }

        let length = reader.read_u32()?;
        if length != 6 {
            return Err(DecodeError::BadHeaderLength(length));
        }

        let format = Format::from_wire(reader.read_u16()?)?;
        let num_tracks = reader.read_u16()?;

        let division = reader.read_u16()?;
        if division & 0x8000 != 0 {
            // High byte is a negative frame rate (-24, -25, -29, -30);
            // -29 stands for 29.97 drop-frame.
            let frame_byte = (division >> 8) as u8 as i8;
            let frames_per_second = match frame_byte {
                -29 => 29.97,
                v => -v as f32,
            };
            return Err(DecodeError::SmpteDivisionUnsupported {
                frames_per_second,
                ticks_per_frame: (division & 0x00FF) as u8,
            });
        }

        Ok(Self {
            format,
            num_tracks,
            ppqn: division,
        })
    }

    /// Serializes the complete 14-byte header chunk.
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&self.format.as_u16().to_be_bytes());
        out.extend_from_slice(&self.num_tracks.to_be_bytes());
        out.extend_from_slice(&self.ppqn.to_be_bytes());
    }
}

/// The supported SMF formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    /// Format 0: one track carrying all channels.
    SingleMultiChannel,
    /// Format 1: simultaneous tracks sharing one timeline; track 0 is the
    /// conductor track.
    Simultaneous,
}

impl Format {
    /// The format number as written in the header.
    pub const fn as_u16(&self) -> u16 {
        match self {
            Format::SingleMultiChannel => 0,
            Format::Simultaneous => 1,
        }
    }

    fn from_wire(value: u16) -> DecodeResult<Self> {
        match value {
            0 => Ok(Format::SingleMultiChannel),
            1 => Ok(Format::Simultaneous),
            2 => Err(DecodeError::Format2Unsupported),
            other => Err(DecodeError::UnsupportedFormat(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header_bytes(format: u16, tracks: u16, division: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"MThd");
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&format.to_be_bytes());
        bytes.extend_from_slice(&tracks.to_be_bytes());
        bytes.extend_from_slice(&division.to_be_bytes());
        bytes
    }

    #[test]
    fn reads_valid_header() {
        let bytes = header_bytes(1, 3, 480);
        let header = Header::read(&mut Reader::new(&bytes)).unwrap();
        assert_eq!(header.format(), Format::Simultaneous);
        assert_eq!(header.num_tracks(), 3);
        assert_eq!(header.ppqn(), 480);
    }

    #[test]
    fn rejects_bad_tag() {
        let mut bytes = header_bytes(0, 1, 96);
        bytes[0..4].copy_from_slice(b"RIFF");
        let err = Header::read(&mut Reader::new(&bytes)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::BadChunkTag {
                expected: "MThd",
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_length() {
        let mut bytes = header_bytes(0, 1, 96);
        bytes[7] = 7;
        let err = Header::read(&mut Reader::new(&bytes)).unwrap_err();
        assert_eq!(err, DecodeError::BadHeaderLength(7));
    }

    #[test]
    fn format_2_gets_its_own_error() {
        let bytes = header_bytes(2, 4, 480);
        let err = Header::read(&mut Reader::new(&bytes)).unwrap_err();
        assert_eq!(err, DecodeError::Format2Unsupported);

        let bytes = header_bytes(9, 4, 480);
        let err = Header::read(&mut Reader::new(&bytes)).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedFormat(9));
    }

    #[test]
    fn rejects_smpte_division_with_frame_rate() {
        // 0xE3 = -29 (29.97 drop frame), 40 ticks per frame
        let bytes = header_bytes(1, 1, 0xE328);
        let err = Header::read(&mut Reader::new(&bytes)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::SmpteDivisionUnsupported {
                frames_per_second: 29.97,
                ticks_per_frame: 0x28,
            }
        );
    }

    #[test]
    fn header_round_trips_through_bytes() {
        let header = Header::new(Format::Simultaneous, 2, 960);
        let mut out = Vec::new();
        header.write(&mut out);
        let reread = Header::read(&mut Reader::new(&out)).unwrap();
        assert_eq!(header, reread);
    }
}
