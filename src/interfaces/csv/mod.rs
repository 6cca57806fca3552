pub mod doctor_reader;
pub mod payout_reader;
pub mod payout_writer;
