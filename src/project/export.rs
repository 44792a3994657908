#![doc = r#"
Export: project shape → event lists → bytes

Three stages, per track:

1. **Flatten** — every part's notes and control changes become
   absolute-tick events (`part.start_tick + local tick`), with range
   filtering and value normalization applied. Each event is tagged with
   its same-tick sort priority here, since only this stage knows which
   note an on/off pair belongs to.
2. **Sequence** — events sort by tick, tie-broken by the priority tag,
   then convert to delta-times.
3. **Serialize** — the [`crate::file::encode_file`] byte layer.

The conductor track is built once from the full tempo and time-signature
maps, is never range-filtered, and always leads a format 1 file.
"#]

use super::Project;
use crate::file::{Event, Format, Header, MetaEvent, TrackEvent, encode_file};

/// An absolute-tick event awaiting sequencing, with its tie-break
/// priority resolved.
type Pending = (u64, u8, Event);

/// Serializes a project to SMF bytes, optionally restricted to the tick
/// range `[range_start, range_end)`.
///
/// Never fails: out-of-range and non-finite musical values are normalized,
/// not rejected. A note is included when its `[on, off)` interval
/// intersects the range (a zero-duration note counts as the point `on`);
/// a control change when its tick lies inside it.
pub fn encode(project: &Project, range_start: Option<u64>, range_end: Option<u64>) -> Vec<u8> {
    let rs = range_start.unwrap_or(0);
    let re = range_end.unwrap_or(u64::MAX);

    let mut tracks = Vec::with_capacity(project.tracks.len() + 1);
    tracks.push(sequence(conductor_events(project)));
    for track in &project.tracks {
        tracks.push(sequence(instrument_events(track, rs, re)));
    }

    let header = Header::new(
        Format::Simultaneous,
        tracks.len() as u16,
        project.timeline.ppqn,
    );
    encode_file(header, &tracks)
}

fn push(events: &mut Vec<Pending>, tick: u64, event: Event) {
    events.push((tick, event.priority(), event));
}

fn conductor_events(project: &Project) -> Vec<Pending> {
    let mut events = Vec::new();
    for tempo in project.timeline.tempo.entries() {
        push(
            &mut events,
            tempo.tick,
            // SetTempo is 3 bytes on the wire.
            Event::Meta(MetaEvent::SetTempo(tempo.micros_per_quarter.min(0xFF_FFFF))),
        );
    }
    for sig in project.timeline.time_signature.entries() {
        push(
            &mut events,
            sig.tick,
            Event::Meta(MetaEvent::TimeSignature {
                numerator: sig.numerator,
                denominator: normalize_denominator(sig.denominator),
            }),
        );
    }
    events
}

fn instrument_events(track: &super::Track, rs: u64, re: u64) -> Vec<Pending> {
    let mut events = Vec::new();
    if let Some(name) = &track.name {
        push(&mut events, 0, Event::Meta(MetaEvent::TrackName(name.clone())));
    }
    for part in &track.parts {
        for note in &part.notes {
            let on = part.start_tick + note.start_tick;
            let off = on + note.duration_ticks;
            // A zero-duration note is the point `on`, not the empty
            // interval [on, on), which would intersect nothing.
            let included = if on == off {
                (rs..re).contains(&on)
            } else {
                on < re && off > rs
            };
            if !included {
                continue;
            }
            let channel = normalize(note.channel, 15);
            let pitch = normalize(note.pitch, 127);
            let on_event = Event::NoteOn {
                channel,
                pitch,
                velocity: normalize(note.velocity, 127),
            };
            let off_event = Event::NoteOff {
                channel,
                pitch,
                velocity: note.release_velocity.map_or(0, |v| normalize(v, 127)),
            };
            // Off-before-on ordering at a shared tick is for retriggers,
            // where the off closes an earlier note. A zero-duration
            // note's own off must stay after its on or the pair decodes
            // as an orphan off plus an unterminated on.
            let off_priority = if on == off {
                on_event.priority() + 1
            } else {
                off_event.priority()
            };
            push(&mut events, on, on_event);
            events.push((off, off_priority, off_event));
        }
        for cc in &part.control_changes {
            let tick = part.start_tick + cc.tick;
            if !(rs..re).contains(&tick) {
                continue;
            }
            push(
                &mut events,
                tick,
                Event::ControlChange {
                    channel: normalize(cc.channel, 15),
                    controller: normalize(cc.controller, 127),
                    value: normalize(cc.value, 127),
                },
            );
        }
    }
    events
}

/// Sorts concurrent events deterministically and converts absolute ticks
/// to delta-times. The appended EndOfTrack sits at the maximum event tick
/// (not max+1); its priority puts it last among equals.
fn sequence(mut events: Vec<Pending>) -> Vec<TrackEvent> {
    let end = events.iter().map(|(tick, ..)| *tick).max().unwrap_or(0);
    let eot = Event::Meta(MetaEvent::EndOfTrack);
    events.push((end, eot.priority(), eot));
    // Stable: equal (tick, priority) pairs keep construction order.
    events.sort_by_key(|(tick, priority, _)| (*tick, *priority));

    let mut out = Vec::with_capacity(events.len());
    let mut previous = 0u64;
    for (tick, _, event) in events {
        // Deltas past the VLQ range saturate rather than truncate.
        let delta = (tick - previous).min(u64::from(u32::MAX)) as u32;
        out.push(TrackEvent::new(delta, event));
        previous = tick;
    }
    out
}

/// Rounds to the nearest integer and clamps into `[0, max]`. Non-finite
/// input falls back to 0.
fn normalize(value: f64, max: u8) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(max)) as u8
}

/// Snaps a denominator to the nearest SMF-expressible power of two, ties
/// toward the larger candidate (3 becomes 4, not 2).
fn normalize_denominator(denominator: u16) -> u16 {
    const CANDIDATES: [u16; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
    let mut best = CANDIDATES[0];
    for candidate in CANDIDATES {
        let current = i32::from(denominator).abs_diff(i32::from(best));
        let challenger = i32::from(denominator).abs_diff(i32::from(candidate));
        if challenger <= current {
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ControlChange, Note, Part, Track};
    use pretty_assertions::assert_eq;

    fn note(start_tick: u64, duration_ticks: u64, pitch: f64) -> Note {
        Note {
            start_tick,
            duration_ticks,
            pitch,
            velocity: 100.0,
            channel: 0.0,
            release_velocity: None,
        }
    }

    fn one_track_project(parts: Vec<Part>) -> Project {
        Project {
            timeline: crate::timing::Timeline::new(480),
            tracks: vec![Track { name: None, parts }],
        }
    }

    fn note_on_count(events: &[Pending]) -> usize {
        events
            .iter()
            .filter(|(_, _, e)| matches!(e, Event::NoteOn { .. }))
            .count()
    }

    #[test]
    fn normalize_clamps_and_handles_non_finite() {
        assert_eq!(normalize(200.0, 127), 127);
        assert_eq!(normalize(-10.0, 127), 0);
        assert_eq!(normalize(40.0, 15), 15);
        assert_eq!(normalize(300.0, 127), 127);
        assert_eq!(normalize(63.5, 127), 64);
        assert_eq!(normalize(f64::NAN, 127), 0);
        assert_eq!(normalize(f64::INFINITY, 127), 0);
    }

    #[test]
    fn denominator_snaps_to_power_of_two_ties_up() {
        assert_eq!(normalize_denominator(3), 4);
        assert_eq!(normalize_denominator(4), 4);
        assert_eq!(normalize_denominator(5), 4);
        assert_eq!(normalize_denominator(6), 8);
        assert_eq!(normalize_denominator(0), 1);
        assert_eq!(normalize_denominator(1000), 128);
    }

    #[test]
    fn same_tick_retrigger_emits_off_before_on() {
        let project = one_track_project(vec![Part {
            start_tick: 0,
            duration_ticks: 960,
            notes: vec![note(0, 480, 60.0), note(480, 480, 60.0)],
            control_changes: vec![],
        }]);
        let events = sequence(instrument_events(&project.tracks[0], 0, u64::MAX));

        let kinds: Vec<(u32, u8)> = events
            .iter()
            .map(|e| (e.delta, e.event.priority()))
            .collect();
        // on@0, off@480 then on@480 (off priority first), off@960, EoT@960.
        assert_eq!(kinds, vec![(0, 20), (480, 10), (0, 20), (480, 10), (0, 100)]);
    }

    #[test]
    fn zero_duration_note_keeps_on_before_off() {
        let project = one_track_project(vec![Part {
            start_tick: 0,
            duration_ticks: 480,
            notes: vec![note(0, 0, 60.0)],
            control_changes: vec![],
        }]);
        let events = sequence(instrument_events(&project.tracks[0], 0, u64::MAX));
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0].event, Event::NoteOn { .. }));
        assert!(matches!(events[1].event, Event::NoteOff { .. }));
        assert_eq!(events[1].delta, 0);
    }

    #[test]
    fn end_of_track_sits_at_max_event_tick() {
        let cc = Event::ControlChange {
            channel: 0,
            controller: 1,
            value: 2,
        };
        let events = sequence(vec![(240, cc.priority(), cc)]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].delta, 0);
        assert_eq!(events[1].event, Event::Meta(MetaEvent::EndOfTrack));
    }

    #[test]
    fn empty_track_gets_end_of_track_at_zero() {
        let events = sequence(Vec::new());
        assert_eq!(
            events,
            vec![TrackEvent::new(0, Event::Meta(MetaEvent::EndOfTrack))]
        );
    }

    #[test]
    fn delta_past_vlq_range_saturates() {
        let cc = Event::ControlChange {
            channel: 0,
            controller: 1,
            value: 2,
        };
        let events = sequence(vec![(u64::from(u32::MAX) + 10, cc.priority(), cc)]);
        assert_eq!(events[0].delta, u32::MAX);
    }

    #[test]
    fn range_filters_notes_by_intersection_and_ccs_by_containment() {
        let track = Track {
            name: None,
            parts: vec![Part {
                start_tick: 1000,
                duration_ticks: 2000,
                notes: vec![
                    note(0, 500, 60.0),    // [1000,1500) intersects
                    note(500, 100, 62.0),  // [1500,1600) intersects
                    note(1200, 300, 64.0), // [2200,2500) outside
                ],
                control_changes: vec![
                    ControlChange {
                        tick: 100, // absolute 1100, inside
                        controller: 1.0,
                        value: 50.0,
                        channel: 0.0,
                    },
                    ControlChange {
                        tick: 1100, // absolute 2100, outside
                        controller: 1.0,
                        value: 60.0,
                        channel: 0.0,
                    },
                ],
            }],
        };
        let events = instrument_events(&track, 1200, 2000);
        let ccs = events
            .iter()
            .filter(|(_, _, e)| matches!(e, Event::ControlChange { .. }))
            .count();
        assert_eq!(note_on_count(&events), 2);
        assert_eq!(ccs, 0);

        // A note straddling the whole range still intersects it.
        let events = instrument_events(&track, 1400, 1450);
        assert_eq!(note_on_count(&events), 1);
    }

    #[test]
    fn zero_duration_note_is_a_point_for_range_filtering() {
        let track = Track {
            name: None,
            parts: vec![Part {
                start_tick: 0,
                duration_ticks: 960,
                notes: vec![note(0, 0, 60.0), note(480, 0, 62.0), note(960, 0, 64.0)],
                control_changes: vec![],
            }],
        };
        // Unranged export keeps all of them, including the one at tick 0.
        let events = instrument_events(&track, 0, u64::MAX);
        assert_eq!(note_on_count(&events), 3);

        // Ranged: the range-start point is in, the range-end point is out.
        let events = instrument_events(&track, 480, 960);
        let on_ticks: Vec<u64> = events
            .iter()
            .filter(|(_, _, e)| matches!(e, Event::NoteOn { .. }))
            .map(|(tick, ..)| *tick)
            .collect();
        assert_eq!(on_ticks, vec![480]);
    }

    #[test]
    fn conductor_carries_both_maps_unfiltered() {
        let mut project = one_track_project(vec![]);
        project
            .timeline
            .tempo
            .push(crate::timing::TempoChange::new(960, 250_000));
        project
            .timeline
            .time_signature
            .push(crate::timing::TimeSignatureChange::new(1920, 7, 3));

        let events = conductor_events(&project);
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[3].2,
            Event::Meta(MetaEvent::TimeSignature {
                numerator: 7,
                denominator: 4
            })
        ));
    }
}
