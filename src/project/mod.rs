#![doc = r#"
The external project shape the codec reads and produces

The editing application that consumes this crate owns a project store of
tracks, parts, notes, and control changes; the codec only maps between
that shape and the file format. Import builds a fresh [`Project`] per
decode; export flattens one into absolute-tick events.

Musical values on this side are plain `f64`s because the editor feeds
unvalidated numbers (drag math, automation curves). Export normalizes
them into protocol range — it clamps and rounds, never fails.
"#]

mod import;

mod export;
pub use export::encode;

use crate::timing::Timeline;

/// A complete project as far as the codec is concerned: timing context
/// plus instrument tracks.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Project {
    /// PPQN plus the tempo and time-signature maps.
    pub timeline: Timeline,
    /// Instrument tracks. The conductor track is derived from `timeline`
    /// at export time and never stored here.
    pub tracks: Vec<Track>,
}

/// An instrument track: a name and its parts.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    /// Track name, exported as a TrackName meta event at tick 0.
    pub name: Option<String>,
    /// Parts in timeline order. Parts own their notes exclusively.
    pub parts: Vec<Part>,
}

/// A clip on the timeline. Ticks inside a part are relative to the part's
/// own `start_tick`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Part {
    /// Absolute tick where the part starts.
    pub start_tick: u64,
    /// Part length in ticks.
    pub duration_ticks: u64,
    /// Notes, ticks relative to the part.
    pub notes: Vec<Note>,
    /// Control changes, ticks relative to the part.
    pub control_changes: Vec<ControlChange>,
}

/// A note inside a part.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note {
    /// Tick relative to the owning part.
    pub start_tick: u64,
    /// Length in ticks; zero is allowed.
    pub duration_ticks: u64,
    /// Key number; normalized to 0-127 on export.
    pub pitch: f64,
    /// Strike velocity; normalized to 0-127 on export.
    pub velocity: f64,
    /// MIDI channel; normalized to 0-15 on export.
    pub channel: f64,
    /// Release velocity; written on the NoteOff when present.
    pub release_velocity: Option<f64>,
}

/// A controller movement inside a part.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlChange {
    /// Tick relative to the owning part.
    pub tick: u64,
    /// Controller number; normalized to 0-127 on export.
    pub controller: f64,
    /// Controller value; normalized to 0-127 on export.
    pub value: f64,
    /// MIDI channel; normalized to 0-15 on export.
    pub channel: f64,
}
