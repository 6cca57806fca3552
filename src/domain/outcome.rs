use crate::error::{PayoutError, Result};
use serde::Serialize;

/// Normalized result of a settlement attempt.
///
/// Adapters never surface errors past their boundary; everything is folded
/// into one of these two shapes.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ProviderOutcome {
    Paid { provider_reference: String },
    Failed { message: String },
}

impl ProviderOutcome {
    pub fn paid(provider_reference: impl Into<String>) -> Self {
        ProviderOutcome::Paid {
            provider_reference: provider_reference.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ProviderOutcome::Failed {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProviderOutcome::Paid { .. })
    }

    pub fn provider_reference(&self) -> Option<&str> {
        match self {
            ProviderOutcome::Paid { provider_reference } => Some(provider_reference),
            ProviderOutcome::Failed { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ProviderOutcome::Paid { .. } => None,
            ProviderOutcome::Failed { message } => Some(message),
        }
    }
}

impl From<Result<String>> for ProviderOutcome {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(reference) => ProviderOutcome::paid(reference),
            Err(err) => ProviderOutcome::from(err),
        }
    }
}

impl From<PayoutError> for ProviderOutcome {
    fn from(err: PayoutError) -> Self {
        ProviderOutcome::failed(err.to_string())
    }
}
