use thiserror::Error;

#[doc = r#"
A fatal decode failure.

Decoding is all-or-nothing: any of these aborts the whole decode with no
partial result. Malformed *event* data inside a track (unknown meta types,
unsupported messages, orphan note-offs) is never an error; the decoder
skips it while keeping delta-times intact.
"#]
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// The buffer cannot hold a 14-byte header chunk.
    #[error("buffer is {0} bytes; a MIDI file is at least 14")]
    BufferTooShort(usize),

    /// A chunk did not start with the expected 4-character tag.
    #[error("expected `{expected}` tag at offset {offset}, found {found:?}")]
    BadChunkTag {
        /// The tag that should be present (`MThd` or `MTrk`).
        expected: &'static str,
        /// The four bytes actually read.
        found: [u8; 4],
        /// Offset of the tag in the buffer.
        offset: usize,
    },

    /// The header chunk declared a length other than 6.
    #[error("header chunk length is {0}, must be 6")]
    BadHeaderLength(u32),

    /// Format 2 (sequentially independent patterns) is valid SMF but this
    /// codec does not support it.
    #[error("format 2 (sequentially independent tracks) is not supported")]
    Format2Unsupported,

    /// A format number outside the SMF specification entirely.
    #[error("unknown MIDI file format {0}")]
    UnsupportedFormat(u16),

    /// The time division's top bit was set, declaring SMPTE frame timing.
    #[error(
        "SMPTE time division ({frames_per_second} fps, {ticks_per_frame} ticks/frame) is not supported"
    )]
    SmpteDivisionUnsupported {
        /// Frame rate derived from the division's high byte.
        frames_per_second: f32,
        /// Ticks per frame from the division's low byte.
        ticks_per_frame: u8,
    },

    /// A read ran past the end of the buffer.
    #[error("read out of bounds at offset {0}")]
    OutOfBounds(usize),
}

/// Result alias for every decode-side operation.
pub type DecodeResult<T> = Result<T, DecodeError>;
