#![doc = r#"
The SMF decoder

# Shape of the scan

After the 14-byte header is validated, each `MTrk` chunk is scanned byte by
byte with three pieces of local state:

- `current_tick` — running absolute position in the track,
- `running_status` — the last channel-voice status byte, so data bytes with
  no status of their own can be attributed (running status),
- `pending_delta` — ticks accumulated since the last *emitted* event.

`pending_delta` is the piece that keeps skipped data from corrupting
timing: unsupported messages (program change, pitch bend, sysex, unknown
meta, system common) are length-consumed but not emitted, and the ticks
announced before them keep accumulating so the next emitted event's delta
is never short.

A byte that fits no rule at all (no running status, not a recognized
status) advances the cursor by one. That is a best-effort desync guard to
avoid an infinite loop on garbage, not a recovery guarantee.
"#]

use super::{Event, Header, MetaEvent, MetaKind, TrackEvent};
use crate::reader::{DecodeError, DecodeResult, Reader};

/// A decoded MIDI file: validated header plus per-track event lists.
#[derive(Debug, Clone, PartialEq)]
pub struct MidiFile {
    header: Header,
    tracks: Vec<DecodedTrack>,
}

impl MidiFile {
    /// Decodes a complete SMF byte buffer.
    ///
    /// Fatal failures (short buffer, bad tags, header length ≠ 6,
    /// unsupported format, SMPTE division, truncated chunk) abort with no
    /// partial result. Everything else inside a track is skip-and-continue.
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        if bytes.len() < 14 {
            return Err(DecodeError::BufferTooShort(bytes.len()));
        }
        let mut reader = Reader::new(bytes);
        let header = Header::read(&mut reader)?;

        let mut tracks = Vec::with_capacity(header.num_tracks() as usize);
        for _ in 0..header.num_tracks() {
            tracks.push(read_track(&mut reader)?);
        }

        Ok(Self { header, tracks })
    }

    /// The validated header.
    pub const fn header(&self) -> Header {
        self.header
    }

    /// The decoded tracks, in file order.
    pub fn tracks(&self) -> &[DecodedTrack] {
        &self.tracks
    }

    pub(crate) fn from_parts(header: Header, tracks: Vec<DecodedTrack>) -> Self {
        Self { header, tracks }
    }
}

/// One decoded track: its emitted events plus the name pulled from the
/// first TrackName meta, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedTrack {
    /// Name from the first `FF 03` meta event seen in the track.
    pub name: Option<String>,
    /// Emitted events with per-event delta-times.
    pub events: Vec<TrackEvent>,
}

impl DecodedTrack {
    /// Iterates events paired with their absolute tick.
    pub fn absolute_events(&self) -> impl Iterator<Item = (u64, &Event)> {
        self.events.iter().scan(0u64, |tick, ev| {
            *tick += u64::from(ev.delta);
            Some((*tick, &ev.event))
        })
    }
}

fn read_track(reader: &mut Reader<'_>) -> DecodeResult<DecodedTrack> {
    let tag_offset = reader.position();
    let tag = reader.read_tag()?;
    if &tag != b"MTrk" {
        return Err(DecodeError::BadChunkTag {
            expected: "MTrk",
            found: tag,
            offset: tag_offset,
        });
    }
    let length = reader.read_u32()? as usize;
    let end = reader.position() + length;
    if end > reader.len() {
        return Err(DecodeError::OutOfBounds(reader.position()));
    }

    let mut scan = TrackScan::new(end);
    while reader.position() < end {
        if scan.step(reader)? == ScanStep::Finished {
            break;
        }
    }
    // Realign to the declared chunk boundary whether the track ended with
    // an EndOfTrack meta or just ran out of declared bytes.
    reader.seek(end)?;

    Ok(scan.track)
}

#[derive(PartialEq)]
enum ScanStep {
    Continue,
    Finished,
}

/// Scan state for one track chunk, local to a single decode call.
struct TrackScan {
    end: usize,
    current_tick: u64,
    pending_delta: u32,
    running_status: Option<u8>,
    track: DecodedTrack,
}

impl TrackScan {
    fn new(end: usize) -> Self {
        Self {
            end,
            current_tick: 0,
            pending_delta: 0,
            running_status: None,
            track: DecodedTrack::default(),
        }
    }

    fn step(&mut self, reader: &mut Reader<'_>) -> DecodeResult<ScanStep> {
        let delta = reader.read_vlq()?;
        self.current_tick += u64::from(delta);
        // Many skipped events can pile more ticks into one pending delta
        // than a single wire delta could carry; saturate instead of
        // overflowing.
        self.pending_delta = self.pending_delta.saturating_add(delta);

        let byte = reader.peek_u8()?;
        match byte {
            0xFF => {
                reader.skip(1)?;
                self.running_status = None;
                self.read_meta(reader)
            }
            0xF0 | 0xF7 => {
                // SysEx: payload is intentionally not preserved anywhere.
                reader.skip(1)?;
                let len = reader.read_vlq()?;
                reader.skip(len as usize)?;
                self.running_status = None;
                Ok(ScanStep::Continue)
            }
            0xF1..=0xFE => {
                reader.skip(1)?;
                reader.skip(system_common_data_len(byte))?;
                self.running_status = None;
                Ok(ScanStep::Continue)
            }
            0x80..=0xEF => {
                reader.skip(1)?;
                self.running_status = Some(byte);
                self.read_voice(reader, byte)
            }
            _ => match self.running_status {
                // Data byte under running status: same dispatch, one fewer
                // consumed byte.
                Some(status) => self.read_voice(reader, status),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        byte,
                        offset = reader.position(),
                        "stray data byte with no running status, skipping one byte"
                    );
                    reader.skip(1)?;
                    Ok(ScanStep::Continue)
                }
            },
        }
    }

    fn read_meta(&mut self, reader: &mut Reader<'_>) -> DecodeResult<ScanStep> {
        let kind_byte = reader.read_u8()?;
        let len = reader.read_vlq()? as usize;
        let payload = reader.read_bytes(len)?;

        let Ok(kind) = MetaKind::try_from(kind_byte) else {
            // Unrecognized meta: fully consumed, nothing emitted, and
            // pending_delta stays put for the next emitted event.
            #[cfg(feature = "tracing")]
            tracing::debug!(kind = kind_byte, len, "skipping unrecognized meta event");
            return Ok(ScanStep::Continue);
        };

        let meta = match kind {
            MetaKind::SetTempo => {
                if payload.len() < 3 {
                    return Ok(ScanStep::Continue);
                }
                let mpq = u32::from(payload[0]) << 16
                    | u32::from(payload[1]) << 8
                    | u32::from(payload[2]);
                MetaEvent::SetTempo(mpq)
            }
            MetaKind::TimeSignature => {
                if payload.len() < 2 {
                    return Ok(ScanStep::Continue);
                }
                // Denominator is stored as a power-of-two exponent; the
                // trailing clock bytes are ignored.
                MetaEvent::TimeSignature {
                    numerator: payload[0],
                    denominator: 1u16 << payload[1].min(15),
                }
            }
            MetaKind::TrackName => {
                let name = String::from_utf8_lossy(payload).into_owned();
                if self.track.name.is_none() {
                    self.track.name = Some(name.clone());
                }
                MetaEvent::TrackName(name)
            }
            MetaKind::EndOfTrack => {
                self.emit(Event::Meta(MetaEvent::EndOfTrack));
                reader.seek(self.end)?;
                return Ok(ScanStep::Finished);
            }
        };
        self.emit(Event::Meta(meta));
        Ok(ScanStep::Continue)
    }

    fn read_voice(&mut self, reader: &mut Reader<'_>, status: u8) -> DecodeResult<ScanStep> {
        let channel = status & 0x0F;
        match status & 0xF0 {
            0x80 => {
                let (pitch, velocity) = self.read_data_pair(reader)?;
                self.emit(Event::NoteOff {
                    channel,
                    pitch,
                    velocity,
                });
            }
            0x90 => {
                let (pitch, velocity) = self.read_data_pair(reader)?;
                // Velocity-0 NoteOn is the wire idiom for NoteOff.
                if velocity == 0 {
                    self.emit(Event::NoteOff {
                        channel,
                        pitch,
                        velocity: 0,
                    });
                } else {
                    self.emit(Event::NoteOn {
                        channel,
                        pitch,
                        velocity,
                    });
                }
            }
            0xB0 => {
                let (controller, value) = self.read_data_pair(reader)?;
                self.emit(Event::ControlChange {
                    channel,
                    controller,
                    value,
                });
            }
            // Poly pressure and pitch bend: two data bytes, not emitted.
            0xA0 | 0xE0 => {
                reader.skip(2)?;
            }
            // Program change and channel pressure: one data byte, not emitted.
            0xC0 | 0xD0 => {
                reader.skip(1)?;
            }
            _ => unreachable!("status {status:#04x} is not channel voice"),
        }
        Ok(ScanStep::Continue)
    }

    fn read_data_pair(&mut self, reader: &mut Reader<'_>) -> DecodeResult<(u8, u8)> {
        let a = reader.read_u8()? & 0x7F;
        let b = reader.read_u8()? & 0x7F;
        Ok((a, b))
    }

    fn emit(&mut self, event: Event) {
        self.track
            .events
            .push(TrackEvent::new(self.pending_delta, event));
        self.pending_delta = 0;
    }
}

/// Fixed data lengths for system common / real-time messages, so their
/// bytes can be consumed without desyncing the scan.
const fn system_common_data_len(status: u8) -> usize {
    match status {
        0xF1 => 1, // MTC quarter frame
        0xF2 => 2, // song position pointer
        0xF3 => 1, // song select
        // Tune request, timing clock, start, continue, stop, active
        // sensing, and the undefined slots carry no data.
        _ => 0,
    }
}
