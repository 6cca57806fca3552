use super::payout::{Payout, PayoutProvider, PayoutStatus};
use crate::error::{PayoutError, Result};
use chrono::{DateTime, Utc};

/// A partial update to a payout, guarded by the lifecycle rules.
///
/// ```text
/// DRAFT ─approve─> APPROVED ─┐
///   │                        ├─begin─> PROCESSING ─settle─> PAID
///   └────────────begin───────┘             │
///                     FAILED <──fail/abandon─┘
///                        └──────begin (retry)──> PROCESSING
/// ```
///
/// `Abandon` is the operator's way out for a payout whose outcome could not be
/// recorded and is stuck in PROCESSING.
///
/// Stores apply a transition atomically: the status check and the write happen
/// under the same lock, so at most one attempt per payout can be in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Approve {
        admin_id: Option<String>,
    },
    BeginProcessing,
    Settle {
        provider: PayoutProvider,
        provider_reference: String,
        processed_at: DateTime<Utc>,
    },
    Fail {
        provider: PayoutProvider,
        reason: String,
    },
    Abandon {
        reason: String,
    },
}

impl Transition {
    pub fn target(&self) -> PayoutStatus {
        match self {
            Transition::Approve { .. } => PayoutStatus::Approved,
            Transition::BeginProcessing => PayoutStatus::Processing,
            Transition::Settle { .. } => PayoutStatus::Paid,
            Transition::Fail { .. } | Transition::Abandon { .. } => PayoutStatus::Failed,
        }
    }

    pub fn allowed_from(&self) -> &'static [PayoutStatus] {
        match self {
            Transition::Approve { .. } => &[PayoutStatus::Draft, PayoutStatus::Approved],
            Transition::BeginProcessing => &[
                PayoutStatus::Draft,
                PayoutStatus::Approved,
                PayoutStatus::Failed,
            ],
            Transition::Settle { .. } | Transition::Fail { .. } | Transition::Abandon { .. } => {
                &[PayoutStatus::Processing]
            }
        }
    }

    /// Applies the transition in place, or leaves the payout untouched and
    /// returns [`PayoutError::InvalidTransition`].
    pub fn apply(self, payout: &mut Payout) -> Result<()> {
        if !self.allowed_from().contains(&payout.status) {
            return Err(PayoutError::InvalidTransition {
                id: payout.id.clone(),
                from: payout.status,
                to: self.target(),
            });
        }

        payout.status = self.target();
        match self {
            Transition::Approve { admin_id } => {
                // first approver wins
                if payout.approved_by_admin_id.is_none() {
                    payout.approved_by_admin_id = admin_id;
                }
            }
            Transition::BeginProcessing => {}
            Transition::Settle {
                provider,
                provider_reference,
                processed_at,
            } => {
                payout.provider.get_or_insert(provider);
                payout.provider_reference = Some(provider_reference);
                payout.processed_at = Some(processed_at);
                payout.last_failure_reason = None;
            }
            Transition::Fail { provider, reason } => {
                payout.provider.get_or_insert(provider);
                payout.last_failure_reason = Some(reason);
            }
            Transition::Abandon { reason } => {
                payout.last_failure_reason = Some(reason);
            }
        }
        Ok(())
    }
}
