use super::ensure_success;
use crate::domain::ports::{TransferClient, TransferReceipt, TransferRequest};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// Creates Stripe Connect transfers through the REST API.
#[derive(Clone)]
pub struct StripeRestClient {
    http: Client,
    api_base: String,
    secret_key: String,
}

impl StripeRestClient {
    pub fn new(http: Client, api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }
}

#[async_trait]
impl TransferClient for StripeRestClient {
    async fn create_transfer(&self, request: TransferRequest) -> Result<TransferReceipt> {
        let amount = request.amount_minor_units.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            ("destination", request.destination_account_id.as_str()),
            ("description", request.description.as_str()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/transfers", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        let receipt = ensure_success("Stripe", response)
            .await?
            .json::<TransferReceipt>()
            .await?;
        Ok(receipt)
    }
}
