#![doc = r#"
Musical time: tempo map, time-signature map, and conversions

# The three clocks

An editor timeline speaks three time representations:

- **ticks** — the file's own grid, sized by PPQN (ticks per quarter note),
- **seconds** — wall time, which depends on every tempo change up to the
  point in question,
- **measures** — bar positions, which depend on the time-signature map but
  *not* on tempo (a 6/8 bar is 1440 ticks at PPQN 480 whatever the BPM).

[`Timeline`] owns the PPQN plus both maps and provides the four pure
conversions between them. Conversions walk map segments, so spans that
cross any number of tempo or meter changes come out exact.

Both maps are ordered, non-empty override lists: a lookup takes the entry
with the greatest tick at or before the query, and a query before every
entry takes the first. Duplicate ticks are allowed and mean an
instantaneous change — the later entry wins.
"#]

mod cache;
pub use cache::*;

/// Microseconds per quarter note at 120 BPM, the SMF default tempo.
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

/// A tempo override taking effect at a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TempoChange {
    /// Absolute tick where this tempo takes effect.
    pub tick: u64,
    /// Microseconds per quarter note.
    pub micros_per_quarter: u32,
}

impl TempoChange {
    /// Creates a tempo change from microseconds per quarter note.
    pub const fn new(tick: u64, micros_per_quarter: u32) -> Self {
        Self {
            tick,
            micros_per_quarter,
        }
    }

    /// Creates a tempo change from beats per minute.
    pub fn from_bpm(tick: u64, bpm: f64) -> Self {
        Self {
            tick,
            micros_per_quarter: (60_000_000.0 / bpm).round() as u32,
        }
    }

    /// This tempo as beats per minute.
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / f64::from(self.micros_per_quarter)
    }

    /// Seconds one tick lasts under this tempo.
    pub fn seconds_per_tick(&self, ppqn: u16) -> f64 {
        f64::from(self.micros_per_quarter) / 1e6 / f64::from(ppqn)
    }
}

/// A meter override taking effect at a tick. A change also starts a new
/// measure, even mid-bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignatureChange {
    /// Absolute tick where this meter takes effect.
    pub tick: u64,
    /// Beats per measure.
    pub numerator: u8,
    /// Note value of one beat (4 = quarter, 8 = eighth, ...).
    pub denominator: u16,
}

impl TimeSignatureChange {
    /// Creates a time-signature change.
    pub const fn new(tick: u64, numerator: u8, denominator: u16) -> Self {
        Self {
            tick,
            numerator,
            denominator,
        }
    }

    /// Length of one measure in ticks: `ppqn × numerator × 4/denominator`.
    /// Independent of tempo.
    pub fn ticks_per_measure(&self, ppqn: u16) -> f64 {
        f64::from(ppqn) * f64::from(self.numerator) * 4.0 / f64::from(self.denominator)
    }
}

macro_rules! tick_map {
    ($(#[$doc:meta])* $name:ident, $entry:ty, $default:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            entries: Vec<$entry>,
            version: u64,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    entries: vec![$default],
                    version: 0,
                }
            }
        }

        impl $name {
            /// Builds a map from entries, sorting them by tick (stable, so
            /// duplicate-tick entries keep their relative order). An empty
            /// input yields the default single entry.
            pub fn from_entries(mut entries: Vec<$entry>) -> Self {
                if entries.is_empty() {
                    return Self::default();
                }
                entries.sort_by_key(|e| e.tick);
                Self {
                    entries,
                    version: 0,
                }
            }

            /// The ordered entries. Never empty.
            pub fn entries(&self) -> &[$entry] {
                &self.entries
            }

            /// Inserts an entry, keeping tick order. An entry at an
            /// already-present tick lands after it (instantaneous change:
            /// the later entry wins lookups).
            pub fn push(&mut self, entry: $entry) {
                let at = self.entries.partition_point(|e| e.tick <= entry.tick);
                self.entries.insert(at, entry);
                self.version += 1;
            }

            /// Replaces all entries. An empty input restores the default.
            pub fn replace(&mut self, entries: Vec<$entry>) {
                let version = self.version + 1;
                *self = Self::from_entries(entries);
                self.version = version;
            }

            /// The entry in effect at `tick`: greatest entry tick ≤ `tick`,
            /// or the first entry when the query precedes all of them.
            pub fn at(&self, tick: u64) -> &$entry {
                let at = self.entries.partition_point(|e| e.tick <= tick);
                &self.entries[at.saturating_sub(1)]
            }

            /// Mutation counter, for keying/invalidating timing caches.
            pub const fn version(&self) -> u64 {
                self.version
            }
        }
    };
}

tick_map!(
    /// Ordered-by-tick tempo overrides. Defaults to a single 120 BPM entry
    /// at tick 0.
    TempoMap,
    TempoChange,
    TempoChange::new(0, DEFAULT_MICROS_PER_QUARTER)
);

tick_map!(
    /// Ordered-by-tick meter overrides. Defaults to 4/4 at tick 0.
    TimeSignatureMap,
    TimeSignatureChange,
    TimeSignatureChange::new(0, 4, 4)
);

/// The timing context for one project: resolution plus both maps.
///
/// All four conversions are pure functions of the timeline's state —
/// identical inputs give identical outputs, which is what licenses
/// memoizing them in a [`TimingCache`]. Whoever mutates the maps must
/// invalidate any cache built over them.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timeline {
    /// Ticks per quarter note.
    pub ppqn: u16,
    /// Tempo overrides.
    pub tempo: TempoMap,
    /// Meter overrides.
    pub time_signature: TimeSignatureMap,
}

impl Timeline {
    /// Creates a timeline with default maps (120 BPM, 4/4).
    pub fn new(ppqn: u16) -> Self {
        Self {
            ppqn,
            ..Self::default()
        }
    }

    /// The tempo in effect at `tick`.
    pub fn tempo_at(&self, tick: u64) -> &TempoChange {
        self.tempo.at(tick)
    }

    /// The meter in effect at `tick`.
    pub fn time_signature_at(&self, tick: u64) -> &TimeSignatureChange {
        self.time_signature.at(tick)
    }

    /// Seconds spanned by `[start_tick, start_tick + duration_ticks)`,
    /// accounting for every tempo change inside the span.
    pub fn ticks_to_seconds(&self, start_tick: f64, duration_ticks: f64) -> f64 {
        let end = start_tick + duration_ticks;
        let mut seconds = 0.0;
        let mut pos = start_tick;
        while pos < end {
            let tempo = self.tempo.at(pos.max(0.0) as u64);
            let next = self
                .next_tempo_boundary(pos)
                .map_or(end, |b| b.min(end))
                .max(pos);
            seconds += (next - pos) * tempo.seconds_per_tick(self.ppqn);
            if next == pos {
                break;
            }
            pos = next;
        }
        seconds
    }

    /// The (possibly fractional) tick reached after `seconds` of wall time
    /// from tick 0, advancing through tempo segments in time order.
    pub fn seconds_to_ticks(&self, seconds: f64) -> f64 {
        let mut remaining = seconds;
        let mut tick = 0.0f64;
        let entries = self.tempo.entries();
        for (i, entry) in entries.iter().enumerate() {
            let spt = entry.seconds_per_tick(self.ppqn);
            let Some(next) = entries.get(i + 1) else {
                // Final segment is unbounded.
                return tick + remaining / spt;
            };
            let segment_ticks = (next.tick as f64 - tick).max(0.0);
            let segment_seconds = segment_ticks * spt;
            if remaining < segment_seconds {
                return tick + remaining / spt;
            }
            remaining -= segment_seconds;
            tick = tick.max(next.tick as f64);
        }
        tick
    }

    /// Converts a fractional measure position (integer part = measure
    /// index, fraction = offset within the measure) to ticks. Tempo plays
    /// no part; only the meter map and PPQN do.
    pub fn measure_to_ticks(&self, measure: f64) -> f64 {
        let entries = self.time_signature.entries();
        let mut measure_base = 0.0f64;
        let mut tick_base = 0.0f64;
        for (i, entry) in entries.iter().enumerate() {
            let tpm = entry.ticks_per_measure(self.ppqn);
            let Some(next) = entries.get(i + 1) else {
                return tick_base + (measure - measure_base) * tpm;
            };
            let segment_ticks = (next.tick as f64 - tick_base).max(0.0);
            let segment_measures = segment_ticks / tpm;
            if measure < measure_base + segment_measures {
                return tick_base + (measure - measure_base) * tpm;
            }
            measure_base += segment_measures;
            tick_base = tick_base.max(next.tick as f64);
        }
        tick_base
    }

    /// Converts a tick to a fractional measure position. Inverse of
    /// [`Timeline::measure_to_ticks`].
    pub fn ticks_to_measure(&self, tick: f64) -> f64 {
        let entries = self.time_signature.entries();
        let mut measure_base = 0.0f64;
        let mut tick_base = 0.0f64;
        for (i, entry) in entries.iter().enumerate() {
            let tpm = entry.ticks_per_measure(self.ppqn);
            let Some(next) = entries.get(i + 1) else {
                return measure_base + (tick - tick_base) / tpm;
            };
            if tick < next.tick as f64 {
                return measure_base + (tick - tick_base) / tpm;
            }
            let segment_ticks = (next.tick as f64 - tick_base).max(0.0);
            measure_base += segment_ticks / tpm;
            tick_base = tick_base.max(next.tick as f64);
        }
        measure_base
    }

    /// Combined map version, for keying timing caches.
    pub const fn version(&self) -> (u64, u64) {
        (self.tempo.version(), self.time_signature.version())
    }

    /// Smallest tempo-entry tick strictly greater than `pos`.
    fn next_tempo_boundary(&self, pos: f64) -> Option<f64> {
        self.tempo
            .entries()
            .iter()
            .map(|e| e.tick as f64)
            .find(|&t| t > pos)
    }
}
