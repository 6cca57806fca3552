use crate::application::registry::ProviderRegistry;
use crate::application::selector::select_provider;
use crate::config::DEFAULT_PROVIDER_TIMEOUT;
use crate::domain::doctor::DoctorSettlementProfile;
use crate::domain::outcome::ProviderOutcome;
use crate::domain::payout::{Payout, PayoutFilter, PayoutProvider, PayoutStatus};
use crate::domain::ports::{DoctorStoreBox, PayoutStoreBox};
use crate::domain::state::Transition;
use crate::error::{PayoutError, Result};
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// A payout together with the doctor it is owed to.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PayoutDetails {
    #[serde(flatten)]
    pub payout: Payout,
    pub doctor: Option<DoctorSettlementProfile>,
}

/// The entry point for settling doctor payouts.
///
/// `PayoutEngine` owns the storage backends and the provider registry. Each
/// trigger runs to completion before returning; the store's atomic transitions
/// guarantee at most one in-flight attempt per payout.
pub struct PayoutEngine {
    payout_store: PayoutStoreBox,
    doctor_store: DoctorStoreBox,
    providers: ProviderRegistry,
    provider_timeout: Duration,
}

impl PayoutEngine {
    /// Creates a new `PayoutEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `payout_store` - The store for payout records.
    /// * `doctor_store` - The store for doctor settlement profiles.
    /// * `providers` - The adapters available for dispatch.
    pub fn new(
        payout_store: PayoutStoreBox,
        doctor_store: DoctorStoreBox,
        providers: ProviderRegistry,
    ) -> Self {
        Self {
            payout_store,
            doctor_store,
            providers,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Bounds each adapter call. An adapter that exceeds it fails the payout.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Settles one payout through its provider.
    ///
    /// Returns `Err` only when the payout does not exist, when it is already
    /// PROCESSING or PAID, or when storage fails. Every provider-side failure is
    /// returned as [`ProviderOutcome::Failed`] and persisted as FAILED.
    ///
    /// If the outcome cannot be recorded even after a retry, the payout stays
    /// PROCESSING and has to be released with [`PayoutEngine::abandon_payout`].
    pub async fn trigger_payout(&self, payout_id: &str) -> Result<ProviderOutcome> {
        let payout = self
            .payout_store
            .find_payout(payout_id)
            .await?
            .ok_or_else(|| PayoutError::NotFound(payout_id.to_string()))?;

        // Read before the PROCESSING write; a profile update after this point
        // is only seen by the next attempt.
        let doctor = self
            .doctor_store
            .find_doctor_profile(&payout.doctor_id)
            .await?;
        let provider = select_provider(&payout);

        let payout = self
            .payout_store
            .transition(payout_id, Transition::BeginProcessing)
            .await?;
        info!(payout_id, %provider, amount = %payout.amount_due, currency = %payout.currency, "Payout processing");

        let outcome = match doctor {
            Some(doctor) => self.dispatch(provider, &payout, &doctor).await,
            None => ProviderOutcome::failed("Doctor settlement profile not found"),
        };

        let transition = match &outcome {
            ProviderOutcome::Paid { provider_reference } => Transition::Settle {
                provider,
                provider_reference: provider_reference.clone(),
                processed_at: Utc::now(),
            },
            ProviderOutcome::Failed { message } => Transition::Fail {
                provider,
                reason: message.clone(),
            },
        };
        let payout = self.record_outcome(payout_id, transition).await?;

        match &outcome {
            ProviderOutcome::Paid { provider_reference } => {
                info!(payout_id, %provider, %provider_reference, status = %payout.status, "Payout settled")
            }
            ProviderOutcome::Failed { message } => {
                warn!(payout_id, %provider, %message, status = %payout.status, "Payout failed")
            }
        }

        Ok(outcome)
    }

    /// Writes the terminal transition, retrying once on a storage error. The
    /// provider has already been called at this point, so giving up leaves the
    /// payout PROCESSING.
    async fn record_outcome(&self, payout_id: &str, transition: Transition) -> Result<Payout> {
        match self.payout_store.transition(payout_id, transition.clone()).await {
            Ok(payout) => Ok(payout),
            Err(err @ (PayoutError::NotFound(_) | PayoutError::InvalidTransition { .. })) => Err(err),
            Err(err) => {
                warn!(payout_id, error = %err, "Recording payout outcome failed, retrying");
                self.payout_store
                    .transition(payout_id, transition)
                    .await
                    .inspect_err(|err| {
                        error!(payout_id, error = %err, "Payout outcome not recorded, payout left PROCESSING")
                    })
            }
        }
    }

    async fn dispatch(
        &self,
        provider: PayoutProvider,
        payout: &Payout,
        doctor: &DoctorSettlementProfile,
    ) -> ProviderOutcome {
        let Some(adapter) = self.providers.get(provider) else {
            return PayoutError::UnsupportedProvider(provider.to_string()).into();
        };

        match tokio::time::timeout(self.provider_timeout, adapter.run(payout, doctor)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(payout_id = %payout.id, %provider, timeout = ?self.provider_timeout, "Provider call timed out");
                PayoutError::ProviderTimeout.into()
            }
        }
    }

    /// Records an admin's approval. Only DRAFT or APPROVED payouts can be approved.
    pub async fn mark_payout_as_approved(
        &self,
        payout_id: &str,
        admin_id: Option<String>,
    ) -> Result<Payout> {
        let payout = self
            .payout_store
            .transition(payout_id, Transition::Approve { admin_id })
            .await?;
        info!(payout_id, approved_by = ?payout.approved_by_admin_id, "Payout approved");
        Ok(payout)
    }

    /// Moves a payout stuck in PROCESSING to FAILED so it can be triggered again.
    ///
    /// Meant for an operator who has checked the provider side; nothing is sent
    /// to any provider.
    pub async fn abandon_payout(&self, payout_id: &str, reason: Option<String>) -> Result<Payout> {
        let reason = reason.unwrap_or_else(|| "Abandoned by operator".to_string());
        let payout = self
            .payout_store
            .transition(payout_id, Transition::Abandon { reason })
            .await?;
        warn!(payout_id, reason = ?payout.last_failure_reason, "Payout abandoned");
        Ok(payout)
    }

    pub async fn get_payout_by_id(&self, payout_id: &str) -> Result<Option<PayoutDetails>> {
        let Some(payout) = self.payout_store.find_payout(payout_id).await? else {
            return Ok(None);
        };
        let doctor = self
            .doctor_store
            .find_doctor_profile(&payout.doctor_id)
            .await?;
        Ok(Some(PayoutDetails { payout, doctor }))
    }

    /// Lists payouts matching `filter`, most recent period first.
    pub async fn list_payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>> {
        let mut payouts = self.payout_store.list_payouts(filter).await?;
        payouts.sort_by(|a, b| {
            b.period_start
                .cmp(&a.period_start)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(payouts)
    }

    /// Triggers every APPROVED payout (and FAILED ones when `include_failed`),
    /// oldest period first.
    ///
    /// A payout another caller moved on in the meantime is reported as a failed
    /// outcome instead of aborting the run.
    pub async fn settle_pending(
        &self,
        include_failed: bool,
    ) -> Result<Vec<(String, ProviderOutcome)>> {
        let mut pending = self
            .list_payouts(&PayoutFilter {
                status: Some(PayoutStatus::Approved),
                ..Default::default()
            })
            .await?;
        if include_failed {
            pending.extend(
                self.list_payouts(&PayoutFilter {
                    status: Some(PayoutStatus::Failed),
                    ..Default::default()
                })
                .await?,
            );
        }
        pending.sort_by(|a, b| a.period_start.cmp(&b.period_start).then_with(|| a.id.cmp(&b.id)));
        debug!(count = pending.len(), include_failed, "Settling pending payouts");

        let mut results = Vec::with_capacity(pending.len());
        for payout in pending {
            let outcome = match self.trigger_payout(&payout.id).await {
                Ok(outcome) => outcome,
                Err(err @ (PayoutError::NotFound(_) | PayoutError::InvalidTransition { .. })) => {
                    warn!(payout_id = %payout.id, error = %err, "Skipping payout");
                    err.into()
                }
                Err(err) => return Err(err),
            };
            results.push((payout.id, outcome));
        }
        Ok(results)
    }
}
