use crate::config::DEFAULT_PAYPAL_CURRENCY;
use crate::domain::doctor::DoctorSettlementProfile;
use crate::domain::outcome::ProviderOutcome;
use crate::domain::payout::{Payout, PayoutProvider};
use crate::domain::ports::{
    PayoutBatch, PayoutBatchItem, PayoutsClient, SettlementProvider, TokenProvider,
};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::RoundingStrategy;
use std::sync::Arc;
use tracing::debug;

/// Settles payouts as single-item PayPal payout batches to the doctor's email.
pub struct PayPalPayoutsProvider {
    live: Option<(Arc<dyn TokenProvider>, Arc<dyn PayoutsClient>)>,
    default_currency: String,
}

impl PayPalPayoutsProvider {
    pub fn simulated() -> Self {
        Self {
            live: None,
            default_currency: DEFAULT_PAYPAL_CURRENCY.to_string(),
        }
    }

    pub fn live(tokens: Arc<dyn TokenProvider>, payouts: Arc<dyn PayoutsClient>) -> Self {
        Self {
            live: Some((tokens, payouts)),
            default_currency: DEFAULT_PAYPAL_CURRENCY.to_string(),
        }
    }

    /// Currency used when a payout has none set.
    pub fn with_default_currency(mut self, currency: impl Into<String>) -> Self {
        self.default_currency = currency.into();
        self
    }

    async fn settle(&self, payout: &Payout, doctor: &DoctorSettlementProfile) -> Result<String> {
        let receiver = doctor.paypal_email().ok_or_else(|| {
            PayoutError::ConfigurationMissing(
                "Doctor has no PayPal payout email configured".to_string(),
            )
        })?;

        let Some((tokens, payouts)) = &self.live else {
            debug!(payout_id = %payout.id, "Simulating PayPal payout");
            return Ok(format!("paypal_payout_sim_{}", payout.id));
        };

        let access_token = tokens.access_token().await?;
        let (start, end) = payout.period_label();
        let amount = payout
            .amount_due
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let batch = PayoutBatch {
            sender_batch_id: format!("payout_{}_{}", payout.id, Utc::now().timestamp_millis()),
            email_subject: "You have a payout".to_string(),
            items: vec![PayoutBatchItem {
                receiver: receiver.to_string(),
                amount: format!("{amount:.2}"),
                currency: payout.currency_or(&self.default_currency).to_string(),
                note: format!("Payout for {start} to {end}"),
                sender_item_id: payout.id.clone(),
            }],
        };

        let receipt = payouts.submit_batch(&access_token, batch).await?;
        Ok(receipt.batch_id)
    }
}

#[async_trait]
impl SettlementProvider for PayPalPayoutsProvider {
    fn kind(&self) -> PayoutProvider {
        PayoutProvider::PaypalPayouts
    }

    async fn run(&self, payout: &Payout, doctor: &DoctorSettlementProfile) -> ProviderOutcome {
        self.settle(payout, doctor).await.into()
    }
}
