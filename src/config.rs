//! Platform-side provider configuration.
//!
//! Each rail carries an explicit [`ProviderMode`]. When the mode key is absent
//! the mode is inferred from whether the rail's credentials are present, so an
//! environment without live credentials settles everything in simulation.

use crate::error::{PayoutError, Result};
use std::time::Duration;

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PAYPAL_CURRENCY: &str = "USD";
const STRIPE_API_BASE: &str = "https://api.stripe.com";
const PAYPAL_API_BASE: &str = "https://api-m.sandbox.paypal.com";
const MPESA_API_BASE: &str = "https://sandbox.safaricom.co.ke";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    Live,
    Simulated,
}

impl ProviderMode {
    fn parse(key: &str, value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(ProviderMode::Live),
            "simulated" | "sim" => Ok(ProviderMode::Simulated),
            other => Err(PayoutError::ConfigError(format!(
                "{key} must be 'live' or 'simulated', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StripeSettings {
    pub mode: ProviderMode,
    pub secret_key: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayPalSettings {
    pub mode: ProviderMode,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_base: String,
    pub default_currency: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MpesaSettings {
    pub mode: ProviderMode,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub initiator_name: Option<String>,
    pub security_credential: Option<String>,
    /// Paying organisation shortcode (PartyA).
    pub shortcode: Option<String>,
    pub result_url: Option<String>,
    pub timeout_url: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BankSettings {
    pub mode: ProviderMode,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayoutConfig {
    pub provider_timeout: Duration,
    pub stripe: StripeSettings,
    pub paypal: PayPalSettings,
    pub mpesa: MpesaSettings,
    pub bank: BankSettings,
}

impl PayoutConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Every rail simulated, default timeout.
    pub fn simulated() -> Self {
        Self {
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            stripe: StripeSettings {
                mode: ProviderMode::Simulated,
                secret_key: None,
                api_base: STRIPE_API_BASE.into(),
            },
            paypal: PayPalSettings {
                mode: ProviderMode::Simulated,
                client_id: None,
                client_secret: None,
                api_base: PAYPAL_API_BASE.into(),
                default_currency: DEFAULT_PAYPAL_CURRENCY.into(),
            },
            mpesa: MpesaSettings {
                mode: ProviderMode::Simulated,
                consumer_key: None,
                consumer_secret: None,
                initiator_name: None,
                security_credential: None,
                shortcode: None,
                result_url: None,
                timeout_url: None,
                api_base: MPESA_API_BASE.into(),
            },
            bank: BankSettings {
                mode: ProviderMode::Simulated,
                api_url: None,
                api_key: None,
            },
        }
    }

    /// Builds configuration from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider_timeout = match get("PAYOUT_PROVIDER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    PayoutError::ConfigError(format!(
                        "PAYOUT_PROVIDER_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                    ))
                })?;
                if secs == 0 {
                    return Err(PayoutError::ConfigError(
                        "PAYOUT_PROVIDER_TIMEOUT_SECS must be at least 1".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_PROVIDER_TIMEOUT,
        };

        let stripe_key = get("STRIPE_SECRET_KEY");
        let stripe = StripeSettings {
            mode: resolve_mode(
                "STRIPE_PAYOUT_MODE",
                get("STRIPE_PAYOUT_MODE"),
                &[("STRIPE_SECRET_KEY", &stripe_key)],
            )?,
            secret_key: stripe_key,
            api_base: get("STRIPE_API_BASE").unwrap_or_else(|| STRIPE_API_BASE.into()),
        };

        let paypal_id = get("PAYPAL_CLIENT_ID");
        let paypal_secret = get("PAYPAL_CLIENT_SECRET");
        let paypal = PayPalSettings {
            mode: resolve_mode(
                "PAYPAL_PAYOUT_MODE",
                get("PAYPAL_PAYOUT_MODE"),
                &[
                    ("PAYPAL_CLIENT_ID", &paypal_id),
                    ("PAYPAL_CLIENT_SECRET", &paypal_secret),
                ],
            )?,
            client_id: paypal_id,
            client_secret: paypal_secret,
            api_base: get("PAYPAL_API_BASE").unwrap_or_else(|| PAYPAL_API_BASE.into()),
            default_currency: get("PAYPAL_DEFAULT_CURRENCY")
                .map(|c| c.trim().to_ascii_uppercase())
                .unwrap_or_else(|| DEFAULT_PAYPAL_CURRENCY.into()),
        };

        let consumer_key = get("MPESA_CONSUMER_KEY");
        let consumer_secret = get("MPESA_CONSUMER_SECRET");
        let initiator_name = get("MPESA_B2C_INITIATOR_NAME");
        let security_credential = get("MPESA_B2C_SECURITY_CREDENTIAL");
        let shortcode = get("MPESA_B2C_SHORTCODE");
        let mpesa = MpesaSettings {
            mode: resolve_mode(
                "MPESA_B2C_MODE",
                get("MPESA_B2C_MODE"),
                &[
                    ("MPESA_B2C_INITIATOR_NAME", &initiator_name),
                    ("MPESA_B2C_SECURITY_CREDENTIAL", &security_credential),
                    ("MPESA_B2C_SHORTCODE", &shortcode),
                    ("MPESA_CONSUMER_KEY", &consumer_key),
                    ("MPESA_CONSUMER_SECRET", &consumer_secret),
                ],
            )?,
            consumer_key,
            consumer_secret,
            initiator_name,
            security_credential,
            shortcode,
            result_url: get("MPESA_B2C_RESULT_URL"),
            timeout_url: get("MPESA_B2C_TIMEOUT_URL"),
            api_base: get("MPESA_API_BASE").unwrap_or_else(|| MPESA_API_BASE.into()),
        };

        let bank_url = get("BANK_PAYOUT_API_URL");
        let bank_key = get("BANK_PAYOUT_API_KEY");
        let bank = BankSettings {
            mode: resolve_mode(
                "BANK_PAYOUT_MODE",
                get("BANK_PAYOUT_MODE"),
                &[
                    ("BANK_PAYOUT_API_URL", &bank_url),
                    ("BANK_PAYOUT_API_KEY", &bank_key),
                ],
            )?,
            api_url: bank_url,
            api_key: bank_key,
        };

        Ok(Self {
            provider_timeout,
            stripe,
            paypal,
            mpesa,
            bank,
        })
    }
}

/// An explicit mode wins; otherwise the rail is live only when every required
/// credential is present. Explicit `live` with missing credentials is an error.
fn resolve_mode(
    mode_key: &str,
    explicit: Option<String>,
    required: &[(&str, &Option<String>)],
) -> Result<ProviderMode> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| *key)
        .collect();

    match explicit {
        Some(raw) => {
            let mode = ProviderMode::parse(mode_key, &raw)?;
            if mode == ProviderMode::Live && !missing.is_empty() {
                return Err(PayoutError::ConfigError(format!(
                    "{mode_key}=live requires {}",
                    missing.join(", ")
                )));
            }
            Ok(mode)
        }
        None if missing.is_empty() => Ok(ProviderMode::Live),
        None => Ok(ProviderMode::Simulated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<PayoutConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PayoutConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_empty_source_simulates_everything() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.stripe.mode, ProviderMode::Simulated);
        assert_eq!(cfg.paypal.mode, ProviderMode::Simulated);
        assert_eq!(cfg.mpesa.mode, ProviderMode::Simulated);
        assert_eq!(cfg.bank.mode, ProviderMode::Simulated);
        assert_eq!(cfg.provider_timeout, DEFAULT_PROVIDER_TIMEOUT);
        assert_eq!(cfg.paypal.default_currency, "USD");
        assert_eq!(cfg, PayoutConfig::simulated());
    }

    #[test]
    fn test_credentials_imply_live() {
        let cfg = config(&[
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
        ])
        .unwrap();
        assert_eq!(cfg.stripe.mode, ProviderMode::Live);
        assert_eq!(cfg.paypal.mode, ProviderMode::Live);
        assert_eq!(cfg.bank.mode, ProviderMode::Simulated);
    }

    #[test]
    fn test_partial_mpesa_trio_simulates() {
        let cfg = config(&[
            ("MPESA_CONSUMER_KEY", "key"),
            ("MPESA_CONSUMER_SECRET", "secret"),
            ("MPESA_B2C_INITIATOR_NAME", "testapi"),
            ("MPESA_B2C_SHORTCODE", "600000"),
        ])
        .unwrap();
        assert_eq!(cfg.mpesa.mode, ProviderMode::Simulated);
    }

    #[test]
    fn test_explicit_simulated_overrides_credentials() {
        let cfg = config(&[
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_PAYOUT_MODE", "simulated"),
        ])
        .unwrap();
        assert_eq!(cfg.stripe.mode, ProviderMode::Simulated);
    }

    #[test]
    fn test_explicit_live_without_credentials_is_an_error() {
        let err = config(&[("BANK_PAYOUT_MODE", "live"), ("BANK_PAYOUT_API_KEY", "k")])
            .unwrap_err();
        match err {
            PayoutError::ConfigError(msg) => assert!(msg.contains("BANK_PAYOUT_API_URL")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("PAYPAL_PAYOUT_MODE", "sometimes")]),
            Err(PayoutError::ConfigError(_))
        ));
        assert!(matches!(
            config(&[("PAYOUT_PROVIDER_TIMEOUT_SECS", "soon")]),
            Err(PayoutError::ConfigError(_))
        ));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        match config(&[("PAYOUT_PROVIDER_TIMEOUT_SECS", "0")]) {
            Err(PayoutError::ConfigError(msg)) => {
                assert!(msg.contains("PAYOUT_PROVIDER_TIMEOUT_SECS"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let cfg = config(&[("PAYOUT_PROVIDER_TIMEOUT_SECS", "1")]).unwrap();
        assert_eq!(cfg.provider_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let cfg = config(&[("STRIPE_SECRET_KEY", "  "), ("PAYOUT_PROVIDER_TIMEOUT_SECS", "5")])
            .unwrap();
        assert_eq!(cfg.stripe.mode, ProviderMode::Simulated);
        assert_eq!(cfg.provider_timeout, Duration::from_secs(5));
    }
}
