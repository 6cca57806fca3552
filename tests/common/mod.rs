use chrono::{DateTime, TimeZone, Utc};
use payroute::application::engine::PayoutEngine;
use payroute::application::registry::ProviderRegistry;
use payroute::domain::doctor::DoctorSettlementProfile;
use payroute::domain::payout::Payout;
use payroute::domain::ports::{DoctorStore, PayoutStore};
use payroute::infrastructure::in_memory::{InMemoryDoctorStore, InMemoryPayoutStore};
use rust_decimal::Decimal;
use std::io::{Error, Write};
use std::path::Path;
use std::process::Command;
use tempfile::NamedTempFile;

pub const PROVIDER_ENV: [&str; 22] = [
    "PAYOUT_PROVIDER_TIMEOUT_SECS",
    "STRIPE_PAYOUT_MODE",
    "STRIPE_SECRET_KEY",
    "STRIPE_API_BASE",
    "PAYPAL_PAYOUT_MODE",
    "PAYPAL_CLIENT_ID",
    "PAYPAL_CLIENT_SECRET",
    "PAYPAL_API_BASE",
    "PAYPAL_DEFAULT_CURRENCY",
    "MPESA_B2C_MODE",
    "MPESA_CONSUMER_KEY",
    "MPESA_CONSUMER_SECRET",
    "MPESA_B2C_INITIATOR_NAME",
    "MPESA_B2C_SECURITY_CREDENTIAL",
    "MPESA_B2C_SHORTCODE",
    "MPESA_B2C_RESULT_URL",
    "MPESA_B2C_TIMEOUT_URL",
    "MPESA_API_BASE",
    "BANK_PAYOUT_MODE",
    "BANK_PAYOUT_API_URL",
    "BANK_PAYOUT_API_KEY",
    "RUST_LOG",
];

pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A one-month payout starting on the first of `month` in 2026.
pub fn monthly_payout(id: &str, doctor_id: &str, month: u32, amount: Decimal, currency: &str) -> Payout {
    Payout::new(
        id,
        doctor_id,
        day(2026, month, 1),
        day(2026, month + 1, 1),
        amount,
        currency,
    )
    .unwrap()
}

pub async fn engine_with(
    payouts: Vec<Payout>,
    doctors: Vec<DoctorSettlementProfile>,
    registry: ProviderRegistry,
) -> PayoutEngine {
    let payout_store = InMemoryPayoutStore::new();
    for payout in payouts {
        payout_store.insert(payout).await.unwrap();
    }
    let doctor_store = InMemoryDoctorStore::new();
    for doctor in doctors {
        doctor_store.store(doctor).await.unwrap();
    }
    PayoutEngine::new(Box::new(payout_store), Box::new(doctor_store), registry)
}

pub fn write_csv(lines: &[&str]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    file.flush()?;
    Ok(file)
}

/// Clears every provider setting so all rails run simulated.
pub fn clean_env(cmd: &mut Command) -> &mut Command {
    for key in PROVIDER_ENV {
        cmd.env_remove(key);
    }
    cmd
}

pub fn fixture(name: &str) -> &'static Path {
    match name {
        "payouts" => Path::new("tests/fixtures/payouts.csv"),
        "doctors" => Path::new("tests/fixtures/doctors.csv"),
        "items" => Path::new("tests/fixtures/items.csv"),
        other => panic!("unknown fixture {other}"),
    }
}
