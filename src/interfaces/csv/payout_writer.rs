use crate::domain::outcome::ProviderOutcome;
use crate::domain::payout::Payout;
use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct PayoutRow<'a> {
    id: &'a str,
    doctor_id: &'a str,
    period_start: String,
    period_end: String,
    amount_due: Decimal,
    currency: &'a str,
    provider: Option<&'static str>,
    status: &'static str,
    provider_reference: Option<&'a str>,
    approved_by_admin_id: Option<&'a str>,
    processed_at: Option<String>,
    last_failure_reason: Option<&'a str>,
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl<'a> From<&'a Payout> for PayoutRow<'a> {
    fn from(payout: &'a Payout) -> Self {
        Self {
            id: &payout.id,
            doctor_id: &payout.doctor_id,
            period_start: timestamp(&payout.period_start),
            period_end: timestamp(&payout.period_end),
            amount_due: payout.amount_due.normalize(),
            currency: &payout.currency,
            provider: payout.provider.map(|p| p.as_str()),
            status: payout.status.as_str(),
            provider_reference: payout.provider_reference.as_deref(),
            approved_by_admin_id: payout.approved_by_admin_id.as_deref(),
            processed_at: payout.processed_at.as_ref().map(timestamp),
            last_failure_reason: payout.last_failure_reason.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OutcomeRow<'a> {
    payout_id: &'a str,
    success: bool,
    provider_reference: Option<&'a str>,
    message: Option<&'a str>,
}

/// Writes payouts and trigger outcomes as CSV.
pub struct PayoutWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PayoutWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_payouts<'a>(&mut self, payouts: impl IntoIterator<Item = &'a Payout>) -> Result<()> {
        for payout in payouts {
            self.writer.serialize(PayoutRow::from(payout))?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_outcomes<'a>(
        &mut self,
        outcomes: impl IntoIterator<Item = (&'a str, &'a ProviderOutcome)>,
    ) -> Result<()> {
        for (payout_id, outcome) in outcomes {
            self.writer.serialize(OutcomeRow {
                payout_id,
                success: outcome.is_success(),
                provider_reference: outcome.provider_reference(),
                message: outcome.message(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
