#![doc = r#"
Import: decoded file → project shape

Tempo and time-signature meta events from *all* tracks merge into the two
timeline maps (format 1 keeps them on the conductor track, format 0 mixes
them in with everything else — merging handles both). Each decoded track
that carries notes or control changes becomes one project track holding a
single part at tick 0 spanning to the track's end; tracks left with
nothing to play (the conductor track, empty tracks) produce no project
track.
"#]

use super::{ControlChange, Note, Part, Project, Track};
use crate::{
    file::{Event, MetaEvent, MidiFile},
    notes::assemble_notes,
    timing::{TempoChange, TimeSignatureChange, TempoMap, TimeSignatureMap, Timeline},
};

impl Project {
    /// Builds a project from a decoded file.
    pub fn from_midi(file: &MidiFile) -> Self {
        let mut tempo_entries = Vec::new();
        let mut sig_entries = Vec::new();
        let mut tracks = Vec::new();

        for decoded in file.tracks() {
            let mut control_changes = Vec::new();
            let mut end_tick = 0u64;

            for (tick, event) in decoded.absolute_events() {
                end_tick = end_tick.max(tick);
                match *event {
                    Event::Meta(MetaEvent::SetTempo(mpq)) => {
                        tempo_entries.push(TempoChange::new(tick, mpq));
                    }
                    Event::Meta(MetaEvent::TimeSignature {
                        numerator,
                        denominator,
                    }) => {
                        sig_entries.push(TimeSignatureChange::new(tick, numerator, denominator));
                    }
                    Event::ControlChange {
                        channel,
                        controller,
                        value,
                    } => {
                        control_changes.push(ControlChange {
                            tick,
                            controller: f64::from(controller),
                            value: f64::from(value),
                            channel: f64::from(channel),
                        });
                    }
                    _ => {}
                }
            }

            let notes: Vec<Note> = assemble_notes(decoded)
                .into_iter()
                .map(|n| Note {
                    start_tick: n.start_tick,
                    duration_ticks: n.duration_ticks,
                    pitch: f64::from(n.pitch),
                    velocity: f64::from(n.velocity),
                    channel: f64::from(n.channel),
                    release_velocity: n.release_velocity.map(f64::from),
                })
                .collect();

            if notes.is_empty() && control_changes.is_empty() {
                continue;
            }

            tracks.push(Track {
                name: decoded.name.clone(),
                parts: vec![Part {
                    start_tick: 0,
                    duration_ticks: end_tick,
                    notes,
                    control_changes,
                }],
            });
        }

        Self {
            timeline: Timeline {
                ppqn: file.header().ppqn(),
                tempo: TempoMap::from_entries(tempo_entries),
                time_signature: TimeSignatureMap::from_entries(sig_entries),
            },
            tracks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{DecodedTrack, Format, Header, TrackEvent};
    use pretty_assertions::assert_eq;

    fn conductor() -> DecodedTrack {
        DecodedTrack {
            name: Some("conductor".into()),
            events: vec![
                TrackEvent::new(0, Event::Meta(MetaEvent::SetTempo(500_000))),
                TrackEvent::new(
                    0,
                    Event::Meta(MetaEvent::TimeSignature {
                        numerator: 3,
                        denominator: 4,
                    }),
                ),
                TrackEvent::new(960, Event::Meta(MetaEvent::SetTempo(1_000_000))),
                TrackEvent::new(0, Event::Meta(MetaEvent::EndOfTrack)),
            ],
        }
    }

    fn piano() -> DecodedTrack {
        DecodedTrack {
            name: Some("Piano".into()),
            events: vec![
                TrackEvent::new(
                    0,
                    Event::NoteOn {
                        channel: 0,
                        pitch: 60,
                        velocity: 100,
                    },
                ),
                TrackEvent::new(
                    480,
                    Event::NoteOff {
                        channel: 0,
                        pitch: 60,
                        velocity: 0,
                    },
                ),
                TrackEvent::new(
                    0,
                    Event::ControlChange {
                        channel: 0,
                        controller: 64,
                        value: 127,
                    },
                ),
                TrackEvent::new(0, Event::Meta(MetaEvent::EndOfTrack)),
            ],
        }
    }

    #[test]
    fn merges_maps_and_skips_the_conductor_track() {
        let file = MidiFile::from_parts(
            Header::new(Format::Simultaneous, 2, 480),
            vec![conductor(), piano()],
        );
        let project = Project::from_midi(&file);

        assert_eq!(project.timeline.ppqn, 480);
        assert_eq!(
            project.timeline.tempo.entries(),
            &[
                TempoChange::new(0, 500_000),
                TempoChange::new(960, 1_000_000)
            ]
        );
        assert_eq!(
            project.timeline.time_signature.entries(),
            &[TimeSignatureChange::new(0, 3, 4)]
        );

        // Conductor produced no instrument track.
        assert_eq!(project.tracks.len(), 1);
        let track = &project.tracks[0];
        assert_eq!(track.name.as_deref(), Some("Piano"));
        let part = &track.parts[0];
        assert_eq!(part.start_tick, 0);
        assert_eq!(part.duration_ticks, 480);
        assert_eq!(part.notes.len(), 1);
        assert_eq!(part.notes[0].duration_ticks, 480);
        assert_eq!(part.control_changes.len(), 1);
        assert_eq!(part.control_changes[0].tick, 480);
    }

    #[test]
    fn empty_maps_fall_back_to_defaults() {
        let file = MidiFile::from_parts(Header::new(Format::SingleMultiChannel, 1, 96), vec![
            piano(),
        ]);
        let project = Project::from_midi(&file);
        assert_eq!(project.timeline.tempo.entries().len(), 1);
        assert_eq!(project.timeline.tempo.entries()[0].micros_per_quarter, 500_000);
        assert_eq!(project.timeline.time_signature.entries()[0].numerator, 4);
    }
}
