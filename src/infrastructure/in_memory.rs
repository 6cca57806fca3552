use crate::domain::doctor::DoctorSettlementProfile;
use crate::domain::payout::{Payout, PayoutFilter};
use crate::domain::ports::{DoctorStore, PayoutStore};
use crate::domain::state::Transition;
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for payouts.
///
/// Uses `Arc<RwLock<HashMap<String, Payout>>>` to allow shared concurrent access.
/// Transitions are checked and applied while holding the write lock.
#[derive(Default, Clone)]
pub struct InMemoryPayoutStore {
    payouts: Arc<RwLock<HashMap<String, Payout>>>,
}

impl InMemoryPayoutStore {
    /// Creates a new, empty in-memory payout store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayoutStore for InMemoryPayoutStore {
    async fn insert(&self, payout: Payout) -> Result<()> {
        let mut payouts = self.payouts.write().await;
        payouts.insert(payout.id.clone(), payout);
        Ok(())
    }

    async fn find_payout(&self, id: &str) -> Result<Option<Payout>> {
        let payouts = self.payouts.read().await;
        Ok(payouts.get(id).cloned())
    }

    async fn transition(&self, id: &str, transition: Transition) -> Result<Payout> {
        let mut payouts = self.payouts.write().await;
        let payout = payouts
            .get_mut(id)
            .ok_or_else(|| PayoutError::NotFound(id.to_string()))?;

        transition.apply(payout)?;
        Ok(payout.clone())
    }

    async fn list_payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>> {
        let payouts = self.payouts.read().await;
        Ok(payouts
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }
}

/// A thread-safe in-memory store for doctor settlement profiles.
#[derive(Default, Clone)]
pub struct InMemoryDoctorStore {
    doctors: Arc<RwLock<HashMap<String, DoctorSettlementProfile>>>,
}

impl InMemoryDoctorStore {
    /// Creates a new, empty in-memory doctor store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DoctorStore for InMemoryDoctorStore {
    async fn store(&self, profile: DoctorSettlementProfile) -> Result<()> {
        let mut doctors = self.doctors.write().await;
        doctors.insert(profile.doctor_id.clone(), profile);
        Ok(())
    }

    async fn find_doctor_profile(
        &self,
        doctor_id: &str,
    ) -> Result<Option<DoctorSettlementProfile>> {
        let doctors = self.doctors.read().await;
        Ok(doctors.get(doctor_id).cloned())
    }
}
