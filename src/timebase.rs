//! Wall-clock-since-launch, derived from the persisted timestamp plus
//! scheduler ticks. The two halves of that derivation (`secs_since_launch`
//! and the tick at which it was last stamped) are updated as a pair under
//! [`crate::seqlock::Published`], so readers never observe a torn mix of
//! old timestamp with new tick reference or vice versa.

use crate::constants::ORBITAL_PERIOD_S;
use crate::seqlock::Published;

#[derive(Debug, Clone, Copy)]
struct TimeFields {
    secs_since_launch: u32,
    last_write_ms: u64,
}

pub struct Timebase {
    fields: Published<TimeFields>,
}

impl Timebase {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: Published::new(TimeFields {
                secs_since_launch: 0,
                last_write_ms: 0,
            }),
        }
    }

    /// Stamps both halves together. Called once per `flush` with the value
    /// just written to NV and the tick at which it was written.
    pub fn stamp(&self, secs_since_launch: u32, write_tick_ms: u64) {
        self.fields.write(TimeFields {
            secs_since_launch,
            last_write_ms: write_tick_ms,
        });
    }

    #[must_use]
    fn snapshot(&self) -> TimeFields {
        self.fields.read()
    }

    /// The raw `(secs_since_launch, last_write_ms)` pair, for callers that
    /// need to save and later restore the pre-flush stamp verbatim (the
    /// monotonic-clock rollback on a confirm-after-write mismatch).
    #[must_use]
    pub fn current_stamp(&self) -> (u32, u64) {
        let fields = self.snapshot();
        (fields.secs_since_launch, fields.last_write_ms)
    }

    /// `secs_since_launch + (ticks_now_ms - last_write_ms) / 1000`.
    #[must_use]
    pub fn now_seconds(&self, ticks_now_ms: u64) -> u64 {
        let fields = self.snapshot();
        u64::from(fields.secs_since_launch) + ticks_now_ms.saturating_sub(fields.last_write_ms) / 1000
    }

    /// Same derivation at millisecond precision.
    #[must_use]
    pub fn now_ms(&self, ticks_now_ms: u64) -> u64 {
        let fields = self.snapshot();
        u64::from(fields.secs_since_launch) * 1000 + ticks_now_ms.saturating_sub(fields.last_write_ms)
    }

    /// Returns TRUE exactly once per orbit-fraction bucket of `1/denom`
    /// orbits, updating `*prev_bucket` in place. `denom` cancels out of
    /// `now * denom / (ORBITAL_PERIOD_S * denom)` algebraically, so the
    /// bucket boundary is really once per full orbit; this keeps the
    /// multiply-then-divide shape rather than reducing it.
    pub fn passed_orbit_fraction(&self, prev_bucket: &mut u64, denom: u64, ticks_now_ms: u64) -> bool {
        let now = self.now_seconds(ticks_now_ms);
        let bucket = now * denom / (ORBITAL_PERIOD_S * denom);

        if bucket != *prev_bucket {
            *prev_bucket = bucket;
            true
        } else {
            false
        }
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::new()
    }
}
