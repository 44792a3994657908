use super::Timeline;
use std::collections::HashMap;

#[doc = r#"
Explicit memoization over the four timing conversions.

UI layout code calls the conversions constantly with the same arguments
(pixel↔tick mapping repaints), and each call walks the maps. Since the
conversions are pure in (arguments, map contents), caching is sound as
long as the cache is told when a map changes: call
[`TimingCache::invalidate`] after every tempo or time-signature mutation.
There is no implicit reactivity.

Entries are additionally keyed by the maps' version counters, so a missed
invalidation degrades to cache misses rather than stale answers.
"#]
#[derive(Debug, Default)]
pub struct TimingCache {
    entries: HashMap<Key, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Conversion {
    TicksToSeconds,
    SecondsToTicks,
    MeasureToTicks,
    TicksToMeasure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    conversion: Conversion,
    // Bit patterns of the f64 arguments; exact-argument reuse is the case
    // being optimized, so bitwise identity is the right equality.
    a: u64,
    b: u64,
    version: (u64, u64),
}

impl TimingCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every memoized entry. Call after mutating the tempo or
    /// time-signature map backing the timeline.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    /// Number of memoized results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Memoized [`Timeline::ticks_to_seconds`].
    pub fn ticks_to_seconds(
        &mut self,
        timeline: &Timeline,
        start_tick: f64,
        duration_ticks: f64,
    ) -> f64 {
        self.memo(
            timeline,
            Conversion::TicksToSeconds,
            start_tick,
            duration_ticks,
            |t| t.ticks_to_seconds(start_tick, duration_ticks),
        )
    }

    /// Memoized [`Timeline::seconds_to_ticks`].
    pub fn seconds_to_ticks(&mut self, timeline: &Timeline, seconds: f64) -> f64 {
        self.memo(timeline, Conversion::SecondsToTicks, seconds, 0.0, |t| {
            t.seconds_to_ticks(seconds)
        })
    }

    /// Memoized [`Timeline::measure_to_ticks`].
    pub fn measure_to_ticks(&mut self, timeline: &Timeline, measure: f64) -> f64 {
        self.memo(timeline, Conversion::MeasureToTicks, measure, 0.0, |t| {
            t.measure_to_ticks(measure)
        })
    }

    /// Memoized [`Timeline::ticks_to_measure`].
    pub fn ticks_to_measure(&mut self, timeline: &Timeline, tick: f64) -> f64 {
        self.memo(timeline, Conversion::TicksToMeasure, tick, 0.0, |t| {
            t.ticks_to_measure(tick)
        })
    }

    fn memo(
        &mut self,
        timeline: &Timeline,
        conversion: Conversion,
        a: f64,
        b: f64,
        compute: impl FnOnce(&Timeline) -> f64,
    ) -> f64 {
        let key = Key {
            conversion,
            a: a.to_bits(),
            b: b.to_bits(),
            version: timeline.version(),
        };
        *self.entries.entry(key).or_insert_with(|| compute(timeline))
    }
}
