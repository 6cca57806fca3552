use super::doctor::DoctorSettlementProfile;
use super::outcome::ProviderOutcome;
use super::payout::{Payout, PayoutFilter, PayoutProvider};
use super::state::Transition;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait PayoutStore: Send + Sync {
    /// Inserts or replaces a payout record.
    async fn insert(&self, payout: Payout) -> Result<()>;
    async fn find_payout(&self, id: &str) -> Result<Option<Payout>>;
    /// Atomically checks and applies a transition. Fails with `NotFound` for an
    /// unknown id and `InvalidTransition` when the current status disallows it.
    async fn transition(&self, id: &str, transition: Transition) -> Result<Payout>;
    async fn list_payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>>;
}

#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn store(&self, profile: DoctorSettlementProfile) -> Result<()>;
    async fn find_doctor_profile(&self, doctor_id: &str)
    -> Result<Option<DoctorSettlementProfile>>;
}

pub type PayoutStoreBox = Box<dyn PayoutStore>;
pub type DoctorStoreBox = Box<dyn DoctorStore>;

/// One settlement rail. Implementations decide internally whether to simulate.
#[async_trait]
pub trait SettlementProvider: Send + Sync {
    fn kind(&self) -> PayoutProvider;
    async fn run(&self, payout: &Payout, doctor: &DoctorSettlementProfile) -> ProviderOutcome;
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct TransferRequest {
    pub amount_minor_units: i64,
    pub currency: String,
    pub destination_account_id: String,
    pub description: String,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct TransferReceipt {
    pub id: String,
}

#[async_trait]
pub trait TransferClient: Send + Sync {
    async fn create_transfer(&self, request: TransferRequest) -> Result<TransferReceipt>;
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PayoutBatch {
    pub sender_batch_id: String,
    pub email_subject: String,
    pub items: Vec<PayoutBatchItem>,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PayoutBatchItem {
    pub receiver: String,
    /// Two-decimal string, as PayPal expects.
    pub amount: String,
    pub currency: String,
    pub note: String,
    pub sender_item_id: String,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct BatchReceipt {
    pub batch_id: String,
}

#[async_trait]
pub trait PayoutsClient: Send + Sync {
    async fn submit_batch(&self, access_token: &str, batch: PayoutBatch) -> Result<BatchReceipt>;
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct B2cRequest {
    pub phone: String,
    pub amount: Decimal,
    pub remarks: String,
}

#[derive(Debug, Deserialize, PartialEq, Clone, Default)]
pub struct B2cReceipt {
    pub conversation_id: Option<String>,
    pub response_description: Option<String>,
}

#[async_trait]
pub trait B2cClient: Send + Sync {
    async fn initiate_b2c(&self, request: B2cRequest) -> Result<B2cReceipt>;
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct BankPayoutRequest {
    pub amount: Decimal,
    pub currency: String,
    pub beneficiary: serde_json::Value,
    pub reference: String,
}

#[derive(Debug, Deserialize, PartialEq, Clone, Default)]
pub struct BankReceipt {
    pub id: Option<String>,
    pub reference: Option<String>,
}

#[async_trait]
pub trait BankApiClient: Send + Sync {
    async fn post_payout(&self, request: BankPayoutRequest) -> Result<BankReceipt>;
}
