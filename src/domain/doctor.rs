use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The settlement identities a doctor has configured for each rail.
///
/// Blank strings and empty bank objects are treated as "not configured".
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct DoctorSettlementProfile {
    pub doctor_id: String,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub stripe_account_id: Option<String>,
    pub paypal_email: Option<String>,
    pub mpesa_phone_number: Option<String>,
    /// Opaque structured bank details, forwarded to the bank API as the beneficiary.
    pub bank_details: Option<Value>,
}

fn configured(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl DoctorSettlementProfile {
    pub fn new(doctor_id: impl Into<String>) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            ..Default::default()
        }
    }

    pub fn stripe_account(&self) -> Option<&str> {
        configured(&self.stripe_account_id)
    }

    pub fn paypal_email(&self) -> Option<&str> {
        configured(&self.paypal_email)
    }

    pub fn mpesa_phone(&self) -> Option<&str> {
        configured(&self.mpesa_phone_number)
    }

    pub fn bank_details(&self) -> Option<&Value> {
        self.bank_details.as_ref().filter(|details| match details {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
    }
}
