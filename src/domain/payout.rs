use crate::error::{PayoutError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a payout. See [`crate::domain::state::Transition`] for the
/// allowed moves between them.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Draft,
    Approved,
    Processing,
    Paid,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Draft => "DRAFT",
            PayoutStatus::Approved => "APPROVED",
            PayoutStatus::Processing => "PROCESSING",
            PayoutStatus::Paid => "PAID",
            PayoutStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutStatus {
    type Err = PayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(PayoutStatus::Draft),
            "APPROVED" => Ok(PayoutStatus::Approved),
            "PROCESSING" => Ok(PayoutStatus::Processing),
            "PAID" => Ok(PayoutStatus::Paid),
            "FAILED" => Ok(PayoutStatus::Failed),
            other => Err(PayoutError::ValidationError(format!(
                "Unknown payout status: {other}"
            ))),
        }
    }
}

/// Settlement rail a payout is routed through.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutProvider {
    StripeConnect,
    PaypalPayouts,
    MpesaB2c,
    BankTransfer,
}

impl PayoutProvider {
    pub const ALL: [PayoutProvider; 4] = [
        PayoutProvider::StripeConnect,
        PayoutProvider::PaypalPayouts,
        PayoutProvider::MpesaB2c,
        PayoutProvider::BankTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutProvider::StripeConnect => "STRIPE_CONNECT",
            PayoutProvider::PaypalPayouts => "PAYPAL_PAYOUTS",
            PayoutProvider::MpesaB2c => "MPESA_B2C",
            PayoutProvider::BankTransfer => "BANK_TRANSFER",
        }
    }
}

impl fmt::Display for PayoutProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutProvider {
    type Err = PayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STRIPE_CONNECT" => Ok(PayoutProvider::StripeConnect),
            "PAYPAL_PAYOUTS" => Ok(PayoutProvider::PaypalPayouts),
            "MPESA_B2C" => Ok(PayoutProvider::MpesaB2c),
            "BANK_TRANSFER" => Ok(PayoutProvider::BankTransfer),
            other => Err(PayoutError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// A single consultation or adjustment contributing to a payout's amount.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PayoutItem {
    pub id: String,
    pub appointment_id: Option<String>,
    pub description: String,
    pub amount: Decimal,
}

/// One settlement obligation owed to one doctor for one accounting period.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payout {
    pub id: String,
    pub doctor_id: String,
    /// Inclusive start of the accounting window.
    pub period_start: DateTime<Utc>,
    /// Exclusive end of the accounting window.
    pub period_end: DateTime<Utc>,
    pub amount_due: Decimal,
    /// ISO-4217-like code. Empty means unset.
    pub currency: String,
    pub provider: Option<PayoutProvider>,
    pub status: PayoutStatus,
    pub provider_reference: Option<String>,
    pub approved_by_admin_id: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub last_failure_reason: Option<String>,
    #[serde(default)]
    pub items: Vec<PayoutItem>,
}

impl Payout {
    /// Creates a new DRAFT payout, validating the period and amount.
    pub fn new(
        id: impl Into<String>,
        doctor_id: impl Into<String>,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        amount_due: Decimal,
        currency: impl Into<String>,
    ) -> Result<Self> {
        if period_start >= period_end {
            return Err(PayoutError::ValidationError(
                "Payout period start must be before its end".to_string(),
            ));
        }
        if amount_due < Decimal::ZERO {
            return Err(PayoutError::ValidationError(
                "Payout amount must not be negative".to_string(),
            ));
        }

        Ok(Self {
            id: id.into(),
            doctor_id: doctor_id.into(),
            period_start,
            period_end,
            amount_due,
            currency: currency.into().trim().to_ascii_uppercase(),
            provider: None,
            status: PayoutStatus::Draft,
            provider_reference: None,
            approved_by_admin_id: None,
            processed_at: None,
            last_failure_reason: None,
            items: Vec::new(),
        })
    }

    pub fn with_provider(mut self, provider: PayoutProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_items(mut self, items: Vec<PayoutItem>) -> Self {
        self.items = items;
        self
    }

    /// Returns the payout currency, or `fallback` when none is set.
    pub fn currency_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.currency.trim().is_empty() {
            fallback
        } else {
            &self.currency
        }
    }

    /// Period bounds as `YYYY-MM-DD`, used in descriptions sent to providers.
    pub fn period_label(&self) -> (String, String) {
        (
            self.period_start.format("%Y-%m-%d").to_string(),
            self.period_end.format("%Y-%m-%d").to_string(),
        )
    }
}

/// Criteria for [`crate::application::engine::PayoutEngine::list_payouts`].
/// Unset fields match everything.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PayoutFilter {
    pub status: Option<PayoutStatus>,
    pub doctor_id: Option<String>,
    pub provider: Option<PayoutProvider>,
    /// Matches payouts whose period starts at or after this instant.
    pub period_from: Option<DateTime<Utc>>,
    /// Matches payouts whose period ends at or before this instant.
    pub period_to: Option<DateTime<Utc>>,
}

impl PayoutFilter {
    pub fn matches(&self, payout: &Payout) -> bool {
        self.status.is_none_or(|s| payout.status == s)
            && self
                .doctor_id
                .as_deref()
                .is_none_or(|d| payout.doctor_id == d)
            && self.provider.is_none_or(|p| payout.provider == Some(p))
            && self.period_from.is_none_or(|from| payout.period_start >= from)
            && self.period_to.is_none_or(|to| payout.period_end <= to)
    }
}
