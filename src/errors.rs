use thiserror_no_std::Error;

/// An error representation for the genuinely exceptional paths of this
/// crate: bringing up the subsystem and one-time provisioning. Routine
/// fault recovery (voting, RAM TMR correction, confirm-mismatch rollback)
/// is logged through [`crate::logging::LogSink`] and never raises this
/// type; setters return `bool`/[`crate::raid::Confidence`] instead.
///
/// # Variants
///
/// * `LockTimeout` - `bus_cache_lock` could not be acquired within budget.
/// * `ProvisionVerifyFailed` - a just-written field read back differently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Lock Acquire Timeout")]
    LockTimeout,
    #[error("Provisioning Verification Failed: field at address {0}")]
    ProvisionVerifyFailed(u32),
}
