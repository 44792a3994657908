#![doc = r#"
Variable-length quantity encoding

# What is a VLQ?

Standard MIDI Files store every delta-time (and every meta/sysex payload
length) as a *variable-length quantity*: the value is split into 7-bit
groups, written most-significant group first, and every byte except the
last has its top bit set as a continuation flag.

```text
value        encoding
0x00         00
0x7F         7F
0x80         81 00
0x3FFF       FF 7F
0x4000       81 80 00
0x0FFFFFFF   FF FF FF 7F
```

The read side lives on [`Reader::read_vlq`](crate::reader::Reader::read_vlq)
so it shares the reader's bounds checking; the write side is here because the
encoder appends straight into an output buffer.
"#]

/// Appends `value` to `out` as a variable-length quantity.
///
/// Zero still emits a single `0x00` byte. All but the final
/// (least-significant) group carry the continuation bit, and groups are
/// written most-significant first.
pub fn write_vlq(value: u32, out: &mut Vec<u8>) {
    let mut groups = [0u8; 5];
    let mut n = 0;
    let mut rest = value;
    loop {
        groups[n] = (rest & 0x7F) as u8;
        n += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (1..n).rev() {
        out.push(groups[i] | 0x80);
    }
    out.push(groups[0]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;
    use pretty_assertions::assert_eq;

    fn encoded(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        write_vlq(value, &mut out);
        out
    }

    #[test]
    fn known_encodings() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(0x40), vec![0x40]);
        assert_eq!(encoded(0x7F), vec![0x7F]);
        assert_eq!(encoded(0x80), vec![0x81, 0x00]);
        assert_eq!(encoded(0x2000), vec![0xC0, 0x00]);
        assert_eq!(encoded(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(encoded(0x4000), vec![0x81, 0x80, 0x00]);
        assert_eq!(encoded(0x0FFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn read_back_what_was_written() {
        for value in [0u32, 1, 0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x0FFF_FFFF] {
            let bytes = encoded(value);
            let mut reader = Reader::new(&bytes);
            assert_eq!(reader.read_vlq().unwrap(), value);
            assert_eq!(reader.position(), bytes.len());
        }
    }
}
