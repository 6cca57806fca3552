//! Settlement adapters, one per rail, and their wiring from configuration.

pub mod bank;
pub mod mpesa;
pub mod paypal;
pub mod stripe;

pub use bank::BankTransferProvider;
pub use mpesa::MpesaB2cProvider;
pub use paypal::PayPalPayoutsProvider;
pub use stripe::StripeConnectProvider;

use crate::application::registry::ProviderRegistry;
use crate::config::{PayoutConfig, ProviderMode};
use crate::error::{PayoutError, Result};
use crate::infrastructure::http::bank::BankRestClient;
use crate::infrastructure::http::build_client;
use crate::infrastructure::http::mpesa::{B2cCredentials, MpesaRestClient};
use crate::infrastructure::http::paypal::PayPalRestClient;
use crate::infrastructure::http::stripe::StripeRestClient;
use std::sync::Arc;
use tracing::info;

/// A registry with every rail in simulated mode.
pub fn simulated_registry() -> ProviderRegistry {
    ProviderRegistry::new()
        .register(Arc::new(StripeConnectProvider::simulated()))
        .register(Arc::new(PayPalPayoutsProvider::simulated()))
        .register(Arc::new(MpesaB2cProvider::simulated()))
        .register(Arc::new(BankTransferProvider::simulated()))
}

fn required(value: &Option<String>, key: &str) -> Result<String> {
    value
        .clone()
        .ok_or_else(|| PayoutError::ConfigError(format!("{key} is not set")))
}

/// Builds every adapter in the mode the configuration selects, sharing one HTTP client.
pub fn registry_from_config(config: &PayoutConfig) -> Result<ProviderRegistry> {
    let http = build_client(config.provider_timeout)?;

    let stripe = match config.stripe.mode {
        ProviderMode::Live => StripeConnectProvider::live(Arc::new(StripeRestClient::new(
            http.clone(),
            &config.stripe.api_base,
            required(&config.stripe.secret_key, "STRIPE_SECRET_KEY")?,
        ))),
        ProviderMode::Simulated => StripeConnectProvider::simulated(),
    };

    let paypal = match config.paypal.mode {
        ProviderMode::Live => {
            let client = Arc::new(PayPalRestClient::new(
                http.clone(),
                &config.paypal.api_base,
                required(&config.paypal.client_id, "PAYPAL_CLIENT_ID")?,
                required(&config.paypal.client_secret, "PAYPAL_CLIENT_SECRET")?,
            ));
            PayPalPayoutsProvider::live(client.clone(), client)
        }
        ProviderMode::Simulated => PayPalPayoutsProvider::simulated(),
    }
    .with_default_currency(&config.paypal.default_currency);

    let mpesa = match config.mpesa.mode {
        ProviderMode::Live => {
            let m = &config.mpesa;
            let credentials = B2cCredentials {
                consumer_key: required(&m.consumer_key, "MPESA_CONSUMER_KEY")?,
                consumer_secret: required(&m.consumer_secret, "MPESA_CONSUMER_SECRET")?,
                initiator_name: required(&m.initiator_name, "MPESA_B2C_INITIATOR_NAME")?,
                security_credential: required(
                    &m.security_credential,
                    "MPESA_B2C_SECURITY_CREDENTIAL",
                )?,
                shortcode: required(&m.shortcode, "MPESA_B2C_SHORTCODE")?,
                result_url: m.result_url.clone().unwrap_or_default(),
                timeout_url: m.timeout_url.clone().unwrap_or_default(),
            };
            MpesaB2cProvider::live(Arc::new(MpesaRestClient::new(
                http.clone(),
                &m.api_base,
                credentials,
            )))
        }
        ProviderMode::Simulated => MpesaB2cProvider::simulated(),
    };

    let bank = match config.bank.mode {
        ProviderMode::Live => BankTransferProvider::live(Arc::new(BankRestClient::new(
            http,
            required(&config.bank.api_url, "BANK_PAYOUT_API_URL")?,
            required(&config.bank.api_key, "BANK_PAYOUT_API_KEY")?,
        ))),
        ProviderMode::Simulated => BankTransferProvider::simulated(),
    };

    info!(
        stripe = ?config.stripe.mode,
        paypal = ?config.paypal.mode,
        mpesa = ?config.mpesa.mode,
        bank = ?config.bank.mode,
        "Settlement providers configured"
    );

    Ok(ProviderRegistry::new()
        .register(Arc::new(stripe))
        .register(Arc::new(paypal))
        .register(Arc::new(mpesa))
        .register(Arc::new(bank)))
}
