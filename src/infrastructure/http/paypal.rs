use super::ensure_success;
use super::token::TokenCache;
use crate::domain::ports::{BatchReceipt, PayoutBatch, PayoutsClient, TokenProvider};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct BatchResponse {
    batch_header: BatchHeader,
}

#[derive(Deserialize)]
struct BatchHeader {
    payout_batch_id: String,
}

/// PayPal Payouts REST client. Also serves as the cached OAuth token provider.
#[derive(Clone)]
pub struct PayPalRestClient {
    http: Client,
    api_base: String,
    client_id: String,
    client_secret: String,
    tokens: Arc<TokenCache>,
}

impl PayPalRestClient {
    pub fn new(
        http: Client,
        api_base: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tokens: Arc::new(TokenCache::new()),
        }
    }

    async fn fetch_token(&self) -> Result<(String, Duration)> {
        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: TokenResponse = ensure_success("PayPal OAuth", response)
            .await?
            .json()
            .await?;
        Ok((token.access_token, Duration::from_secs(token.expires_in)))
    }
}

#[async_trait]
impl TokenProvider for PayPalRestClient {
    async fn access_token(&self) -> Result<String> {
        self.tokens.get_or_refresh(|| self.fetch_token()).await
    }
}

#[async_trait]
impl PayoutsClient for PayPalRestClient {
    async fn submit_batch(&self, access_token: &str, batch: PayoutBatch) -> Result<BatchReceipt> {
        let items: Vec<_> = batch
            .items
            .iter()
            .map(|item| {
                json!({
                    "recipient_type": "EMAIL",
                    "receiver": item.receiver,
                    "amount": { "value": item.amount, "currency": item.currency },
                    "note": item.note,
                    "sender_item_id": item.sender_item_id,
                })
            })
            .collect();
        let body = json!({
            "sender_batch_header": {
                "sender_batch_id": batch.sender_batch_id,
                "email_subject": batch.email_subject,
            },
            "items": items,
        });

        let response = self
            .http
            .post(format!("{}/v1/payments/payouts", self.api_base))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // the next attempt fetches a fresh token
            self.tokens.invalidate().await;
            return Err(PayoutError::TransportError(
                "PayPal rejected the access token".to_string(),
            ));
        }

        let created: BatchResponse = ensure_success("PayPal", response).await?.json().await?;
        Ok(BatchReceipt {
            batch_id: created.batch_header.payout_batch_id,
        })
    }
}
