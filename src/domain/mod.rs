//! Payout domain model: records, lifecycle rules and the ports the
//! application layer depends on.

pub mod doctor;
pub mod outcome;
pub mod payout;
pub mod ports;
pub mod state;
