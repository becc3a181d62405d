//! Contracts consumed from collaborators this crate does not implement:
//! the cooperative scheduler's tick counter and the mode-management task
//! that owns transitions between [`crate::record::SatState`] variants.

/// Scheduler tick source, millisecond resolution. Implemented by the
/// cooperative kernel outside this crate.
pub trait TickSource {
    fn ticks_ms(&self) -> u64;
}

/// Supplies the satellite's current mode at flush time. Implemented by the
/// mode-management task outside this crate; this crate only reads it.
pub trait SatStateSource {
    fn current(&self) -> crate::record::SatState;
}
