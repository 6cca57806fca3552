mod common;

use async_trait::async_trait;
use common::{engine_with, monthly_payout};
use payroute::application::registry::ProviderRegistry;
use payroute::domain::doctor::DoctorSettlementProfile;
use payroute::domain::outcome::ProviderOutcome;
use payroute::domain::payout::{Payout, PayoutProvider, PayoutStatus};
use payroute::domain::ports::SettlementProvider;
use payroute::error::PayoutError;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Counts settlements and holds each one open long enough for rivals to pile up.
struct CountingProvider {
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl SettlementProvider for CountingProvider {
    fn kind(&self) -> PayoutProvider {
        PayoutProvider::StripeConnect
    }

    async fn run(&self, payout: &Payout, _: &DoctorSettlementProfile) -> ProviderOutcome {
        self.runs.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        ProviderOutcome::paid(format!("tr_{}", payout.id))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_triggers_settle_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let registry = ProviderRegistry::new().register(Arc::new(CountingProvider { runs: runs.clone() }));
    let engine = Arc::new(
        engine_with(
            vec![monthly_payout("p-1", "doc-1", 9, dec!(100), "USD")],
            vec![DoctorSettlementProfile::new("doc-1")],
            registry,
        )
        .await,
    );

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move { engine.trigger_payout("p-1").await }));
    }

    let mut settled = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                assert_eq!(outcome, ProviderOutcome::paid("tr_p-1"));
                settled += 1;
            }
            Err(PayoutError::InvalidTransition { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(settled, 1);
    assert_eq!(rejected, 15);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let payout = engine.get_payout_by_id("p-1").await.unwrap().unwrap().payout;
    assert_eq!(payout.status, PayoutStatus::Paid);
}
