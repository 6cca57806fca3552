use crate::domain::doctor::DoctorSettlementProfile;
use crate::domain::payout::{Payout, PayoutFilter};
use crate::domain::ports::{DoctorStore, PayoutStore};
use crate::domain::state::Transition;
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing payout records.
pub const CF_PAYOUTS: &str = "payouts";
/// Column Family for storing doctor settlement profiles.
pub const CF_DOCTORS: &str = "doctors";

/// A persistent store implementation using RocksDB.
///
/// Handles storage for both `Payout` and `DoctorSettlementProfile` entities using
/// separate Column Families, keyed by id, with JSON values.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`). Payout
/// transitions are serialized through a shared write lock so the status check
/// and the write cannot interleave with another trigger.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("payouts" and "doctors") exist.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payouts = ColumnFamilyDescriptor::new(CF_PAYOUTS, Options::default());
        let cf_doctors = ColumnFamilyDescriptor::new(CF_DOCTORS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payouts, cf_doctors])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PayoutError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn put<T: Serialize>(&self, cf_name: &str, key: &str, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key.as_bytes(), bytes)?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PayoutStore for RocksDBStore {
    async fn insert(&self, payout: Payout) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.put(CF_PAYOUTS, &payout.id, &payout)
    }

    async fn find_payout(&self, id: &str) -> Result<Option<Payout>> {
        self.get(CF_PAYOUTS, id)
    }

    async fn transition(&self, id: &str, transition: Transition) -> Result<Payout> {
        let _guard = self.write_lock.lock().await;
        let mut payout: Payout = self
            .get(CF_PAYOUTS, id)?
            .ok_or_else(|| PayoutError::NotFound(id.to_string()))?;

        transition.apply(&mut payout)?;
        self.put(CF_PAYOUTS, id, &payout)?;
        Ok(payout)
    }

    async fn list_payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>> {
        let cf = self.cf(CF_PAYOUTS)?;

        let mut payouts = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let payout: Payout = serde_json::from_slice(&value)?;
            if filter.matches(&payout) {
                payouts.push(payout);
            }
        }

        Ok(payouts)
    }
}

#[async_trait]
impl DoctorStore for RocksDBStore {
    async fn store(&self, profile: DoctorSettlementProfile) -> Result<()> {
        self.put(CF_DOCTORS, &profile.doctor_id, &profile)
    }

    async fn find_doctor_profile(
        &self,
        doctor_id: &str,
    ) -> Result<Option<DoctorSettlementProfile>> {
        self.get(CF_DOCTORS, doctor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payout::{PayoutProvider, PayoutStatus};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn payout(id: &str) -> Payout {
        Payout::new(
            id,
            "doc-1",
            Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap(),
            dec!(100.0),
            "KES",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        // Verify CFs exist
        assert!(store.db.cf_handle(CF_PAYOUTS).is_some());
        assert!(store.db.cf_handle(CF_DOCTORS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_payout_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        store.insert(payout("p1")).await.unwrap();

        let retrieved = store.find_payout("p1").await.unwrap().unwrap();
        assert_eq!(retrieved, payout("p1"));

        let all = store.list_payouts(&PayoutFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);

        assert!(store.find_payout("p2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_transition_persists() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store.insert(payout("p1")).await.unwrap();
            store
                .transition("p1", Transition::BeginProcessing)
                .await
                .unwrap();
            store
                .transition(
                    "p1",
                    Transition::Fail {
                        provider: PayoutProvider::MpesaB2c,
                        reason: "Doctor has no M-Pesa phone number configured".to_string(),
                    },
                )
                .await
                .unwrap();
        }

        let reopened = RocksDBStore::open(dir.path()).unwrap();
        let stored = reopened.find_payout("p1").await.unwrap().unwrap();
        assert_eq!(stored.status, PayoutStatus::Failed);
        assert_eq!(stored.provider, Some(PayoutProvider::MpesaB2c));
        assert!(stored.last_failure_reason.is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_doctor_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let mut profile = DoctorSettlementProfile::new("doc-1");
        profile.mpesa_phone_number = Some("0712345678".to_string());
        store.store(profile.clone()).await.unwrap();

        let retrieved = store.find_doctor_profile("doc-1").await.unwrap().unwrap();
        assert_eq!(retrieved, profile);
    }
}
