//! Per-subject render telemetry.
//!
//! # NON-INTERFERENCE INVARIANT
//! Recording is a side-effect layer for the instrumented code. It must **NEVER** fail, block or
//! panic on the caller's path: bad samples are clamped, disabled categories are no-ops and a
//! re-entrant call is dropped.
//!
//! # LOG INVARIANT
//! Events are immutable once appended. The log only grows at the tail, evicts from the head
//! and is emptied by an explicit clear. Readers always get copies.

pub mod event;
pub mod log;
pub mod metrics;
pub mod recorder;
pub mod sink;
