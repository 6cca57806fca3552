use crate::domain::doctor::DoctorSettlementProfile;
use crate::domain::outcome::ProviderOutcome;
use crate::domain::payout::{Payout, PayoutProvider};
use crate::domain::ports::{B2cClient, B2cRequest, SettlementProvider};
use crate::error::{PayoutError, Result};
use crate::infrastructure::http::mpesa::whole_shillings;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Settles payouts as M-Pesa business-to-customer payments to the doctor's phone.
pub struct MpesaB2cProvider {
    client: Option<Arc<dyn B2cClient>>,
}

impl MpesaB2cProvider {
    pub fn simulated() -> Self {
        Self { client: None }
    }

    pub fn live(client: Arc<dyn B2cClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    async fn settle(&self, payout: &Payout, doctor: &DoctorSettlementProfile) -> Result<String> {
        let phone = doctor.mpesa_phone().ok_or_else(|| {
            PayoutError::ConfigurationMissing(
                "Doctor has no M-Pesa phone number configured".to_string(),
            )
        })?;

        let Some(client) = &self.client else {
            debug!(payout_id = %payout.id, "Simulating M-Pesa B2C payment");
            return Ok(format!("mpesa_b2c_sim_{}", payout.id));
        };

        whole_shillings(payout.amount_due)?;
        let receipt = client
            .initiate_b2c(B2cRequest {
                phone: phone.to_string(),
                amount: payout.amount_due,
                remarks: format!("Payout {}", payout.id),
            })
            .await?;

        receipt
            .conversation_id
            .or(receipt.response_description)
            .ok_or_else(|| {
                PayoutError::TransportError("M-Pesa returned no conversation id".to_string())
            })
    }
}

#[async_trait]
impl SettlementProvider for MpesaB2cProvider {
    fn kind(&self) -> PayoutProvider {
        PayoutProvider::MpesaB2c
    }

    async fn run(&self, payout: &Payout, doctor: &DoctorSettlementProfile) -> ProviderOutcome {
        self.settle(payout, doctor).await.into()
    }
}
