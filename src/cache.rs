//! In-RAM triple-modular redundancy for the cached [`PersistentState`].
//! Three independent copies, corrected by majority vote before every
//! mutation and re-synchronised after.

use crate::logging::{LogCode, LogLocation, LogSink};
use crate::record::PersistentState;

/// Three independent RAM copies of the cached record. Copy 1 is the
/// primary the coordinator mutates; copies 2 and 3 exist purely for
/// error correction.
pub struct CacheTrio {
    pub primary: PersistentState,
    pub copy2: PersistentState,
    pub copy3: PersistentState,
}

impl CacheTrio {
    #[must_use]
    pub fn new(state: PersistentState) -> Self {
        Self {
            primary: state,
            copy2: state,
            copy3: state,
        }
    }

    /// Byte-compares the three copies and corrects any divergence:
    ///
    /// - All three equal: no action.
    /// - Exactly one differs: overwritten from either of the matching
    ///   pair; logged as `CORRUPTED`; a debug-only assert flags the
    ///   detected upset (a recoverable soft error in a production build).
    /// - All three differ pairwise: copy #1 (`primary`) is taken as
    ///   authoritative; logged; debug-asserted.
    pub fn correct_errors(&mut self, log: &dyn LogSink) {
        let p_eq_2 = self.primary == self.copy2;
        let p_eq_3 = self.primary == self.copy3;
        let c2_eq_3 = self.copy2 == self.copy3;

        if p_eq_2 && p_eq_3 {
            return;
        }

        if p_eq_2 {
            debug_assert!(false, "copy3 diverged from an otherwise-agreeing pair");
            self.copy3 = self.primary;
        } else if p_eq_3 {
            debug_assert!(false, "copy2 diverged from an otherwise-agreeing pair");
            self.copy2 = self.primary;
        } else if c2_eq_3 {
            debug_assert!(false, "primary diverged from an otherwise-agreeing pair");
            self.primary = self.copy2;
        } else {
            debug_assert!(false, "all three copies diverge pairwise");
        }

        log.log(LogLocation::CacheVoter, LogCode::Corrupted, false);
    }

    /// Byte-copies `primary` into the other two, restoring agreement after
    /// a mutation.
    pub fn sync_redundancy(&mut self) {
        self.copy2 = self.primary;
        self.copy3 = self.primary;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullLogSink;

    #[test]
    fn three_equal_copies_are_untouched() {
        let state = PersistentState::default();
        let mut trio = CacheTrio::new(state);
        trio.correct_errors(&NullLogSink);
        assert_eq!(trio.primary, trio.copy2);
        assert_eq!(trio.primary, trio.copy3);
    }

    #[test]
    fn single_divergence_is_corrected_from_majority() {
        let mut trio = CacheTrio::new(PersistentState::default());
        trio.copy2.reboot_count = trio.primary.reboot_count + 1;

        trio.correct_errors(&NullLogSink);

        assert_eq!(trio.copy2, trio.primary);
        assert_eq!(trio.copy3, trio.primary);
    }

    #[test]
    fn three_way_split_prefers_primary() {
        let mut trio = CacheTrio::new(PersistentState::default());
        trio.copy2.reboot_count = 1;
        trio.copy3.reboot_count = 2;
        let expected = trio.primary;

        trio.correct_errors(&NullLogSink);

        assert_eq!(trio.primary, expected);
    }

    #[test]
    fn sync_redundancy_copies_primary_everywhere() {
        let mut trio = CacheTrio::new(PersistentState::default());
        trio.primary.reboot_count = 9;
        trio.sync_redundancy();
        assert_eq!(trio.copy2.reboot_count, 9);
        assert_eq!(trio.copy3.reboot_count, 9);
    }
}
