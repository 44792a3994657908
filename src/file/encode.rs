#![doc = r#"
The SMF encoder

Serializes a header plus delta-timed track event lists back into bytes,
mirroring the decoder's byte layout exactly: every event is written with an
explicit status byte (no running status on output), and meta events are
`FF type len payload`.
"#]

use super::{Event, Header, MetaEvent, MetaKind, TrackEvent};
use crate::vlq::write_vlq;

/// Serializes the header chunk and one `MTrk` chunk per event list.
pub fn encode_file(header: Header, tracks: &[Vec<TrackEvent>]) -> Vec<u8> {
    let mut out = Vec::new();
    header.write(&mut out);
    for track in tracks {
        write_track_chunk(track, &mut out);
    }
    out
}

fn write_track_chunk(events: &[TrackEvent], out: &mut Vec<u8>) {
    let mut body = Vec::new();
    for event in events {
        write_vlq(event.delta, &mut body);
        write_event(&event.event, &mut body);
    }
    out.extend_from_slice(b"MTrk");
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
}

fn write_event(event: &Event, out: &mut Vec<u8>) {
    match event {
        Event::NoteOn {
            channel,
            pitch,
            velocity,
        } => {
            out.push(0x90 | (channel & 0x0F));
            out.push(pitch & 0x7F);
            out.push(velocity & 0x7F);
        }
        Event::NoteOff {
            channel,
            pitch,
            velocity,
        } => {
            out.push(0x80 | (channel & 0x0F));
            out.push(pitch & 0x7F);
            out.push(velocity & 0x7F);
        }
        Event::ControlChange {
            channel,
            controller,
            value,
        } => {
            out.push(0xB0 | (channel & 0x0F));
            out.push(controller & 0x7F);
            out.push(value & 0x7F);
        }
        Event::Meta(meta) => write_meta(meta, out),
    }
}

fn write_meta(meta: &MetaEvent, out: &mut Vec<u8>) {
    out.push(0xFF);
    match meta {
        MetaEvent::SetTempo(mpq) => {
            out.push(MetaKind::SetTempo as u8);
            write_vlq(3, out);
            out.push((mpq >> 16) as u8);
            out.push((mpq >> 8) as u8);
            out.push(*mpq as u8);
        }
        MetaEvent::TimeSignature {
            numerator,
            denominator,
        } => {
            out.push(MetaKind::TimeSignature as u8);
            write_vlq(4, out);
            out.push(*numerator);
            // Denominator is a power of two by the time it gets here; the
            // wire wants its exponent.
            out.push(denominator.trailing_zeros() as u8);
            // MIDI clocks per metronome click, 32nd notes per quarter.
            out.push(24);
            out.push(8);
        }
        MetaEvent::TrackName(name) => {
            out.push(MetaKind::TrackName as u8);
            write_vlq(name.len() as u32, out);
            out.extend_from_slice(name.as_bytes());
        }
        MetaEvent::EndOfTrack => {
            out.push(MetaKind::EndOfTrack as u8);
            write_vlq(0, out);
        }
    }
}
