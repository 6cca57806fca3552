use super::ensure_success;
use crate::domain::ports::{BankApiClient, BankPayoutRequest, BankReceipt};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// Generic bank payout API: one JSON POST per transfer, bearer-key auth.
#[derive(Clone)]
pub struct BankRestClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl BankRestClient {
    pub fn new(http: Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl BankApiClient for BankRestClient {
    async fn post_payout(&self, request: BankPayoutRequest) -> Result<BankReceipt> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let receipt = ensure_success("Bank", response)
            .await?
            .json::<BankReceipt>()
            .await?;
        Ok(receipt)
    }
}
