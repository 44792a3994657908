#![doc = r#"
Note assembly: pairing on/off channel events into discrete notes

The wire format has no "note" — only NoteOn and NoteOff events. This
module reconstructs notes by matching each off event against the *oldest*
pending on event for the same `(channel, pitch)` key. FIFO order is what
the SMF standard implies for overlapping notes: two C4 NoteOns followed by
two C4 NoteOffs yield two interleaved notes, never one nested inside the
other.
"#]

use crate::file::{DecodedTrack, Event};
use std::collections::{HashMap, VecDeque};

/// A note reconstructed from a decoded track, positioned in absolute
/// track ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssembledNote {
    /// Absolute tick of the NoteOn.
    pub start_tick: u64,
    /// Ticks between the NoteOn and its matched NoteOff. Zero-length
    /// notes are possible and preserved.
    pub duration_ticks: u64,
    /// Key number, 0-127.
    pub pitch: u8,
    /// Strike velocity from the NoteOn, 1-127.
    pub velocity: u8,
    /// MIDI channel, 0-15.
    pub channel: u8,
    /// Release velocity from the NoteOff, when it carried one.
    ///
    /// A wire NoteOff with velocity 0 and the NoteOn-velocity-0 idiom are
    /// indistinguishable after decoding and serialize identically, so a
    /// zero release is canonicalized to `None`.
    pub release_velocity: Option<u8>,
}

#[derive(Clone, Copy)]
struct PendingOn {
    tick: u64,
    velocity: u8,
}

/// Pairs a track's NoteOn/NoteOff events into notes, sorted by start tick.
///
/// An off event with no pending on is discarded, as is any on event still
/// pending when the track ends. Neither is an error.
pub fn assemble_notes(track: &DecodedTrack) -> Vec<AssembledNote> {
    let mut pending: HashMap<(u8, u8), VecDeque<PendingOn>> = HashMap::new();
    let mut notes = Vec::new();

    for (tick, event) in track.absolute_events() {
        match *event {
            Event::NoteOn {
                channel,
                pitch,
                velocity,
            } => {
                pending
                    .entry((channel, pitch))
                    .or_default()
                    .push_back(PendingOn { tick, velocity });
            }
            Event::NoteOff {
                channel,
                pitch,
                velocity,
            } => {
                let Some(on) = pending
                    .get_mut(&(channel, pitch))
                    .and_then(VecDeque::pop_front)
                else {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(channel, pitch, tick, "discarding orphan NoteOff");
                    continue;
                };
                notes.push(AssembledNote {
                    start_tick: on.tick,
                    duration_ticks: tick - on.tick,
                    pitch,
                    velocity: on.velocity,
                    channel,
                    release_velocity: (velocity > 0).then_some(velocity),
                });
            }
            _ => {}
        }
    }

    #[cfg(feature = "tracing")]
    for ((channel, pitch), queue) in &pending {
        for on in queue {
            tracing::debug!(
                channel,
                pitch,
                tick = on.tick,
                "discarding unterminated NoteOn at track end"
            );
        }
    }

    notes.sort_by_key(|n| n.start_tick);
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::TrackEvent;
    use pretty_assertions::assert_eq;

    fn track(events: Vec<(u32, Event)>) -> DecodedTrack {
        DecodedTrack {
            name: None,
            events: events
                .into_iter()
                .map(|(delta, ev)| TrackEvent::new(delta, ev))
                .collect(),
        }
    }

    fn on(channel: u8, pitch: u8, velocity: u8) -> Event {
        Event::NoteOn {
            channel,
            pitch,
            velocity,
        }
    }

    fn off(channel: u8, pitch: u8, velocity: u8) -> Event {
        Event::NoteOff {
            channel,
            pitch,
            velocity,
        }
    }

    #[test]
    fn pairs_simple_notes() {
        let notes = assemble_notes(&track(vec![
            (0, on(0, 60, 100)),
            (480, off(0, 60, 64)),
            (0, on(0, 64, 90)),
            (240, off(0, 64, 0)),
        ]));
        assert_eq!(
            notes,
            vec![
                AssembledNote {
                    start_tick: 0,
                    duration_ticks: 480,
                    pitch: 60,
                    velocity: 100,
                    channel: 0,
                    release_velocity: Some(64),
                },
                AssembledNote {
                    start_tick: 480,
                    duration_ticks: 240,
                    pitch: 64,
                    velocity: 90,
                    channel: 0,
                    release_velocity: None,
                },
            ]
        );
    }

    #[test]
    fn overlapping_same_pitch_resolves_fifo() {
        // NoteOn@0, NoteOn@480, NoteOff@960, NoteOff@1440 must produce
        // [0,960) and [480,1440), never [0,1440)/[480,960).
        let notes = assemble_notes(&track(vec![
            (0, on(0, 60, 100)),
            (480, on(0, 60, 80)),
            (480, off(0, 60, 0)),
            (480, off(0, 60, 0)),
        ]));
        assert_eq!(notes.len(), 2);
        assert_eq!((notes[0].start_tick, notes[0].duration_ticks), (0, 960));
        assert_eq!(notes[0].velocity, 100);
        assert_eq!((notes[1].start_tick, notes[1].duration_ticks), (480, 960));
        assert_eq!(notes[1].velocity, 80);
    }

    #[test]
    fn channel_and_pitch_key_independently() {
        let notes = assemble_notes(&track(vec![
            (0, on(0, 60, 100)),
            (0, on(1, 60, 101)),
            (100, off(1, 60, 0)),
            (100, off(0, 60, 0)),
        ]));
        assert_eq!(notes.len(), 2);
        // Both start at 0; the stable sort keeps completion order.
        assert_eq!(notes[0].channel, 1);
        assert_eq!(notes[0].duration_ticks, 100);
        assert_eq!(notes[1].channel, 0);
        assert_eq!(notes[1].duration_ticks, 200);
    }

    #[test]
    fn orphan_off_and_unterminated_on_are_dropped() {
        let notes = assemble_notes(&track(vec![
            (0, off(0, 72, 0)), // orphan
            (0, on(0, 60, 100)),
            (480, off(0, 60, 0)),
            (0, on(0, 62, 100)), // never closed
        ]));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].pitch, 60);
    }

    #[test]
    fn zero_duration_note_is_kept() {
        let notes = assemble_notes(&track(vec![(10, on(0, 60, 100)), (0, off(0, 60, 0))]));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].start_tick, 10);
        assert_eq!(notes[0].duration_ticks, 0);
    }
}
