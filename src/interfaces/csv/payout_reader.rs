use crate::domain::payout::{Payout, PayoutItem, PayoutProvider, PayoutStatus};
use crate::error::{PayoutError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of a payouts CSV export.
#[derive(Debug, Deserialize)]
struct PayoutRecord {
    id: String,
    doctor_id: String,
    period_start: String,
    period_end: String,
    amount_due: Decimal,
    currency: Option<String>,
    provider: Option<String>,
    status: Option<String>,
    approved_by_admin_id: Option<String>,
}

/// One row of a payout items CSV export.
#[derive(Debug, Deserialize)]
struct ItemRecord {
    payout_id: String,
    item_id: String,
    appointment_id: Option<String>,
    description: Option<String>,
    amount: Decimal,
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_instant(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| PayoutError::ValidationError(format!("Invalid {field}: '{raw}'")))
}

impl TryFrom<PayoutRecord> for Payout {
    type Error = PayoutError;

    fn try_from(record: PayoutRecord) -> Result<Self> {
        let mut payout = Payout::new(
            record.id,
            record.doctor_id,
            parse_instant("period_start", &record.period_start)?,
            parse_instant("period_end", &record.period_end)?,
            record.amount_due,
            record.currency.unwrap_or_default(),
        )?;

        if let Some(provider) = record.provider {
            payout.provider = Some(provider.parse::<PayoutProvider>()?);
        }
        if let Some(status) = record.status {
            payout.status = match status.parse::<PayoutStatus>()? {
                // only reachable through a settlement attempt
                s @ (PayoutStatus::Processing | PayoutStatus::Paid) => {
                    return Err(PayoutError::ValidationError(format!(
                        "Payout {} cannot be imported as {s}",
                        payout.id
                    )));
                }
                s => s,
            };
        }
        payout.approved_by_admin_id = record.approved_by_admin_id;
        Ok(payout)
    }
}

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

/// Reads payouts from a CSV source.
///
/// Each row is validated as it is read; a bad row yields an `Err` and the
/// iterator carries on with the next one.
pub struct PayoutReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PayoutReader<R> {
    /// Creates a new `PayoutReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        Self {
            reader: csv_reader(source),
        }
    }

    /// Returns an iterator that lazily reads and validates payouts.
    pub fn payouts(self) -> impl Iterator<Item = Result<Payout>> {
        self.reader
            .into_deserialize::<PayoutRecord>()
            .map(|result| result.map_err(PayoutError::from).and_then(Payout::try_from))
    }
}

/// Reads payout line items, keyed by the payout they belong to.
pub struct ItemReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ItemReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: csv_reader(source),
        }
    }

    pub fn items(self) -> impl Iterator<Item = Result<(String, PayoutItem)>> {
        self.reader
            .into_deserialize::<ItemRecord>()
            .map(|result| -> Result<(String, PayoutItem)> {
                let record = result?;
                Ok((
                    record.payout_id,
                    PayoutItem {
                        id: record.item_id,
                        appointment_id: record.appointment_id,
                        description: record.description.unwrap_or_default(),
                        amount: record.amount,
                    },
                ))
            })
    }
}
