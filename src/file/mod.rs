#![doc = r#"
The binary file layer: header, events, decoder, encoder

# File structure

A Standard MIDI File is a 14-byte `MThd` header chunk followed by one
`MTrk` chunk per track:

```text
[Header Chunk: "MThd" len=6 format tracks division]
[Track Chunk 1: "MTrk" len  <delta event>...]
...
[Track Chunk N: "MTrk" len  <delta event>...]
```

[`MidiFile::decode`] turns bytes into tagged per-track event lists;
[`encode_file`] is its exact byte-layout inverse. Both work purely on
in-memory buffers — file I/O belongs to the caller.
"#]

mod header;
pub use header::*;

mod event;
pub use event::*;

mod decode;
pub use decode::*;

mod encode;
pub use encode::*;
