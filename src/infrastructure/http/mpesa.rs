use super::ensure_success;
use super::token::TokenCache;
use crate::domain::ports::{B2cClient, B2cReceipt, B2cRequest};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Daraja returns the lifetime in seconds as a string.
    expires_in: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct B2cResponse {
    #[serde(rename = "ConversationID")]
    conversation_id: Option<String>,
    response_code: Option<String>,
    response_description: Option<String>,
}

/// B2C platform settings required for a live payment request.
#[derive(Debug, Clone)]
pub struct B2cCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub initiator_name: String,
    pub security_credential: String,
    pub shortcode: String,
    pub result_url: String,
    pub timeout_url: String,
}

/// Safaricom Daraja B2C client.
#[derive(Clone)]
pub struct MpesaRestClient {
    http: Client,
    api_base: String,
    credentials: B2cCredentials,
    tokens: Arc<TokenCache>,
}

impl MpesaRestClient {
    pub fn new(http: Client, api_base: impl Into<String>, credentials: B2cCredentials) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
            tokens: Arc::new(TokenCache::new()),
        }
    }

    async fn fetch_token(&self) -> Result<(String, Duration)> {
        let response = self
            .http
            .get(format!(
                "{}/oauth/v1/generate?grant_type=client_credentials",
                self.api_base
            ))
            .basic_auth(
                &self.credentials.consumer_key,
                Some(&self.credentials.consumer_secret),
            )
            .send()
            .await?;

        let token: TokenResponse = ensure_success("M-Pesa OAuth", response)
            .await?
            .json()
            .await?;
        let expires_in = token.expires_in.trim().parse().unwrap_or(3599);
        Ok((token.access_token, Duration::from_secs(expires_in)))
    }
}

/// Normalizes Kenyan numbers to the `2547XXXXXXXX` form Daraja expects.
pub fn normalize_msisdn(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10
        && let Some(local) = digits.strip_prefix('0')
    {
        return format!("254{local}");
    }
    if digits.len() == 9 {
        return format!("254{digits}");
    }
    digits
}

/// B2C moves whole shillings only. Anything else is rejected rather than rounded.
pub fn whole_shillings(amount: Decimal) -> Result<u64> {
    if amount <= Decimal::ZERO || !amount.fract().is_zero() {
        return Err(PayoutError::ValidationError(format!(
            "Invalid M-Pesa amount: {amount}"
        )));
    }
    amount.to_u64().ok_or_else(|| {
        PayoutError::ValidationError(format!("Invalid M-Pesa amount: {amount}"))
    })
}

#[async_trait]
impl B2cClient for MpesaRestClient {
    async fn initiate_b2c(&self, request: B2cRequest) -> Result<B2cReceipt> {
        let amount = whole_shillings(request.amount)?;
        let token = self.tokens.get_or_refresh(|| self.fetch_token()).await?;

        let body = json!({
            "InitiatorName": self.credentials.initiator_name,
            "SecurityCredential": self.credentials.security_credential,
            "CommandID": "BusinessPayment",
            "Amount": amount,
            "PartyA": self.credentials.shortcode,
            "PartyB": normalize_msisdn(&request.phone),
            "Remarks": request.remarks,
            "QueueTimeOutURL": self.credentials.timeout_url,
            "ResultURL": self.credentials.result_url,
            "Occasion": request.remarks,
        });

        let response = self
            .http
            .post(format!("{}/mpesa/b2c/v1/paymentrequest", self.api_base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let accepted: B2cResponse = ensure_success("M-Pesa", response).await?.json().await?;
        if let Some(code) = accepted.response_code.as_deref()
            && code != "0"
        {
            return Err(PayoutError::TransportError(format!(
                "M-Pesa rejected the B2C request ({code}): {}",
                accepted.response_description.unwrap_or_default()
            )));
        }

        Ok(B2cReceipt {
            conversation_id: accepted.conversation_id,
            response_description: accepted.response_description,
        })
    }
}
