#![doc = r#"
The tagged event model shared by the decoder and encoder

A decoded track is an ordered list of [`TrackEvent`]s, each a delta-time in
ticks plus one [`Event`] variant. Only the events this codec round-trips
appear here; everything else in the wire format (program changes, pitch
bend, sysex, unknown meta) is consumed during decode without being emitted.
"#]

use core::fmt;
use num_enum::TryFromPrimitive;

/// One event in a track chunk, tagged with the ticks elapsed since the
/// previous *emitted* event in that track.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackEvent {
    /// Ticks since the previous emitted event (absolute tick for the first).
    pub delta: u32,
    /// The event payload.
    pub event: Event,
}

impl TrackEvent {
    /// Creates a track event.
    pub const fn new(delta: u32, event: Event) -> Self {
        Self { delta, event }
    }
}

/// A channel-voice or meta event, dispatched by explicit discriminant.
///
/// All numeric fields are protocol-bounded: channels are 0-15 and every
/// other data field is 0-127. Decoded events always satisfy this; the
/// export path normalizes project values into range before building one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// Key down. Velocity is always non-zero here; a wire-level NoteOn
    /// with velocity 0 is reclassified as [`Event::NoteOff`] during decode.
    NoteOn {
        /// MIDI channel, 0-15.
        channel: u8,
        /// Key number, 0-127.
        pitch: u8,
        /// Strike velocity, 1-127.
        velocity: u8,
    },
    /// Key up.
    NoteOff {
        /// MIDI channel, 0-15.
        channel: u8,
        /// Key number, 0-127.
        pitch: u8,
        /// Release velocity, 0-127. Zero when the wire event was a
        /// velocity-0 NoteOn.
        velocity: u8,
    },
    /// Controller movement.
    ControlChange {
        /// MIDI channel, 0-15.
        channel: u8,
        /// Controller number, 0-127.
        controller: u8,
        /// Controller value, 0-127.
        value: u8,
    },
    /// A recognized meta event.
    Meta(MetaEvent),
}

impl Event {
    /// Serialization tie-break priority for events at the same tick; lower
    /// sorts earlier. Guarantees a same-tick pitch retrigger writes its
    /// NoteOff before the new NoteOn.
    pub const fn priority(&self) -> u8 {
        match self {
            Event::Meta(MetaEvent::TrackName(_)) => 0,
            Event::Meta(MetaEvent::SetTempo(_)) => 1,
            Event::Meta(MetaEvent::TimeSignature { .. }) => 2,
            Event::NoteOff { .. } => 10,
            Event::ControlChange { .. } => 15,
            Event::NoteOn { .. } => 20,
            Event::Meta(MetaEvent::EndOfTrack) => 100,
        }
    }
}

/// The meta events this codec understands. Every other meta type is
/// length-skipped during decode.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaEvent {
    /// Tempo change: microseconds per quarter note (3-byte big-endian on
    /// the wire). 500_000 is 120 BPM.
    SetTempo(u32),
    /// Meter change. The wire stores the denominator as a power-of-two
    /// exponent; it is expanded here (exponent 3 becomes denominator 8).
    TimeSignature {
        /// Beats per measure.
        numerator: u8,
        /// Note value of one beat (4 = quarter, 8 = eighth, ...).
        denominator: u16,
    },
    /// UTF-8 track name (lossily decoded).
    TrackName(String),
    /// Terminates the track scan.
    EndOfTrack,
}

impl fmt::Display for MetaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaEvent::SetTempo(mpq) => write!(f, "tempo {mpq}µs/quarter"),
            MetaEvent::TimeSignature {
                numerator,
                denominator,
            } => write!(f, "{numerator}/{denominator}"),
            MetaEvent::TrackName(name) => write!(f, "name {name:?}"),
            MetaEvent::EndOfTrack => write!(f, "end of track"),
        }
    }
}

/// Meta event type codes, as written after an `0xFF` status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum MetaKind {
    /// `FF 03 len text`
    TrackName = 0x03,
    /// `FF 2F 00`
    EndOfTrack = 0x2F,
    /// `FF 51 03 tt tt tt`
    SetTempo = 0x51,
    /// `FF 58 04 nn dd cc bb`
    TimeSignature = 0x58,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_note_off_before_note_on() {
        let off = Event::NoteOff {
            channel: 0,
            pitch: 60,
            velocity: 0,
        };
        let on = Event::NoteOn {
            channel: 0,
            pitch: 60,
            velocity: 100,
        };
        assert!(off.priority() < on.priority());
    }

    #[test]
    fn conductor_meta_sorts_before_voice_events() {
        let tempo = Event::Meta(MetaEvent::SetTempo(500_000));
        let sig = Event::Meta(MetaEvent::TimeSignature {
            numerator: 4,
            denominator: 4,
        });
        let cc = Event::ControlChange {
            channel: 0,
            controller: 64,
            value: 127,
        };
        assert!(tempo.priority() < sig.priority());
        assert!(sig.priority() < cc.priority());
        assert!(Event::Meta(MetaEvent::EndOfTrack).priority() > cc.priority());
    }

    #[test]
    fn meta_kind_from_type_byte() {
        assert_eq!(MetaKind::try_from(0x51), Ok(MetaKind::SetTempo));
        assert_eq!(MetaKind::try_from(0x2F), Ok(MetaKind::EndOfTrack));
        assert!(MetaKind::try_from(0x54).is_err());
    }
}
