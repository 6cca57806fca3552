use crate::domain::doctor::DoctorSettlementProfile;
use crate::domain::outcome::ProviderOutcome;
use crate::domain::payout::{Payout, PayoutProvider};
use crate::domain::ports::{BankApiClient, BankPayoutRequest, SettlementProvider};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Settles payouts through the platform's bank transfer API.
pub struct BankTransferProvider {
    client: Option<Arc<dyn BankApiClient>>,
}

impl BankTransferProvider {
    pub fn simulated() -> Self {
        Self { client: None }
    }

    pub fn live(client: Arc<dyn BankApiClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    async fn settle(&self, payout: &Payout, doctor: &DoctorSettlementProfile) -> Result<String> {
        let beneficiary = doctor.bank_details().ok_or_else(|| {
            PayoutError::ConfigurationMissing("Doctor has no bank details configured".to_string())
        })?;

        let Some(client) = &self.client else {
            debug!(payout_id = %payout.id, "Simulating bank transfer");
            return Ok(format!("bank_transfer_sim_{}", payout.id));
        };

        let receipt = client
            .post_payout(BankPayoutRequest {
                amount: payout.amount_due,
                currency: payout.currency.clone(),
                beneficiary: beneficiary.clone(),
                reference: payout.id.clone(),
            })
            .await?;

        receipt.id.or(receipt.reference).ok_or_else(|| {
            PayoutError::TransportError("Bank API returned no transfer reference".to_string())
        })
    }
}

#[async_trait]
impl SettlementProvider for BankTransferProvider {
    fn kind(&self) -> PayoutProvider {
        PayoutProvider::BankTransfer
    }

    async fn run(&self, payout: &Payout, doctor: &DoctorSettlementProfile) -> ProviderOutcome {
        self.settle(payout, doctor).await.into()
    }
}
