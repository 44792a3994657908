#![doc = r#"
SMF structures designed for sequencer editors

`smfkit` decodes and encodes Standard MIDI Files and converts between the
three time representations an editor juggles — ticks, seconds, and
measures — under a time-varying tempo and meter.

# Import

```rust
use smfkit::prelude::*;

let bytes: &[u8] = &[
    0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, // MThd
    0x00, 0x00, 0x00, 0x01, 0x01, 0xE0, // format 0, 1 track, ppqn 480
    0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x0D, // MTrk
    0x00, 0x90, 0x3C, 0x64, // NoteOn C4
    0x83, 0x60, 0x80, 0x3C, 0x00, // NoteOff after 480 ticks
    0x00, 0xFF, 0x2F, 0x00, // EndOfTrack
];

let file = MidiFile::decode(bytes)?;
let project = Project::from_midi(&file);

let note = &project.tracks[0].parts[0].notes[0];
assert_eq!(note.duration_ticks, 480);
# Ok::<(), smfkit::reader::DecodeError>(())
```

# Export

```rust
use smfkit::prelude::*;

let project = Project {
    timeline: Timeline::new(480),
    tracks: vec![],
};
let bytes = encode(&project, None, None);
assert_eq!(&bytes[0..4], b"MThd");
```

# Timing

```rust
use smfkit::prelude::*;

let mut timeline = Timeline::new(480);
timeline.tempo.push(TempoChange::from_bpm(480, 60.0));
let seconds = timeline.ticks_to_seconds(0.0, 960.0);
assert!((seconds - 1.5).abs() < 1e-9);
```

Decoding is strict about structure (bad header, truncated chunks, format
2, SMPTE division all fail) and forgiving about content (unsupported
messages are skipped without desyncing the scan). Encoding never fails:
musical values out of protocol range are clamped and rounded.
"#]

pub mod file;
pub mod notes;
pub mod project;
pub mod reader;
pub mod timing;
pub mod vlq;

/// Everything most callers need.
pub mod prelude {
    pub use crate::file::{
        DecodedTrack, Event, Format, Header, MetaEvent, MetaKind, MidiFile, TrackEvent,
        encode_file,
    };
    pub use crate::notes::{AssembledNote, assemble_notes};
    pub use crate::project::{ControlChange, Note, Part, Project, Track, encode};
    pub use crate::reader::{DecodeError, DecodeResult, Reader};
    pub use crate::timing::{
        TempoChange, TempoMap, TimeSignatureChange, TimeSignatureMap, Timeline, TimingCache,
    };
    pub use crate::vlq::write_vlq;
}
