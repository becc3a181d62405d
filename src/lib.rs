//! Fault-tolerant persistent state subsystem for an embedded flight
//! controller.
//!
//! Combines in-RAM triple-modular redundancy of a cached state record
//! with a quadruple-copy RAID scheme across two non-volatile devices, a
//! read-time voting algorithm that recovers from partial corruption, and
//! a coordinator that serialises cache, RAM redundancy, and NV access
//! under a single coarse lock while exposing a reduced-safety path
//! callable from an interrupt handler.
#![cfg_attr(not(test), no_std)]

pub mod cache;
pub mod codec;
pub mod constants;
pub mod coordinator;
pub mod driver;
pub mod errorlog;
pub mod errors;
pub mod external;
pub mod lock;
pub mod logging;
pub mod provision;
pub mod raid;
pub mod record;
pub mod seqlock;
pub mod test_support;
pub mod timebase;

pub use coordinator::Coordinator;
pub use errors::Error;
pub use raid::Confidence;
pub use record::{EventFlags, PersistentChargingData, PersistentState, SatError, SatEventHistory, SatState};
