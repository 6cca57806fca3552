//! Application layer containing the payout orchestration logic.
//!
//! This module defines the `PayoutEngine`, the entry point admin actions and
//! schedulers call to approve, settle and inspect payouts. Provider selection
//! and adapter lookup live alongside it.

pub mod engine;
pub mod registry;
pub mod selector;
