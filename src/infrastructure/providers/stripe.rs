use crate::domain::doctor::DoctorSettlementProfile;
use crate::domain::outcome::ProviderOutcome;
use crate::domain::payout::{Payout, PayoutProvider};
use crate::domain::ports::{SettlementProvider, TransferClient, TransferRequest};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::debug;

/// Settles payouts as Stripe Connect transfers to the doctor's connected account.
pub struct StripeConnectProvider {
    transfers: Option<Arc<dyn TransferClient>>,
}

impl StripeConnectProvider {
    pub fn simulated() -> Self {
        Self { transfers: None }
    }

    pub fn live(transfers: Arc<dyn TransferClient>) -> Self {
        Self {
            transfers: Some(transfers),
        }
    }

    async fn settle(&self, payout: &Payout, doctor: &DoctorSettlementProfile) -> Result<String> {
        let destination = doctor.stripe_account().ok_or_else(|| {
            PayoutError::ConfigurationMissing(
                "Doctor has no Stripe Connect account configured".to_string(),
            )
        })?;

        let Some(transfers) = &self.transfers else {
            debug!(payout_id = %payout.id, "Simulating Stripe Connect transfer");
            return Ok(format!("stripe_payout_sim_{}", payout.id));
        };

        let amount_minor_units = to_minor_units(payout.amount_due)?;
        let (start, end) = payout.period_label();
        let receipt = transfers
            .create_transfer(TransferRequest {
                amount_minor_units,
                currency: payout.currency_or("usd").to_ascii_lowercase(),
                destination_account_id: destination.to_string(),
                description: format!("Payout {} for {start} - {end}", payout.id),
            })
            .await?;
        Ok(receipt.id)
    }
}

/// Converts a decimal amount to cents, rejecting anything that rounds to zero
/// or below, or that does not fit in cents at all.
fn to_minor_units(amount: Decimal) -> Result<i64> {
    amount
        .checked_mul(dec!(100))
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .filter(|units| *units > 0)
        .ok_or_else(|| PayoutError::ValidationError("Invalid payout amount".to_string()))
}

#[async_trait]
impl SettlementProvider for StripeConnectProvider {
    fn kind(&self) -> PayoutProvider {
        PayoutProvider::StripeConnect
    }

    async fn run(&self, payout: &Payout, doctor: &DoctorSettlementProfile) -> ProviderOutcome {
        self.settle(payout, doctor).await.into()
    }
}
