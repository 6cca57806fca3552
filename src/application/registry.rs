use crate::domain::payout::PayoutProvider;
use crate::domain::ports::SettlementProvider;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps each rail to the adapter that settles it.
///
/// A rail with no registered adapter is reported as unsupported at dispatch.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    adapters: HashMap<PayoutProvider, Arc<dyn SettlementProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its own [`SettlementProvider::kind`], replacing
    /// any previous one.
    pub fn register(mut self, adapter: Arc<dyn SettlementProvider>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    pub fn get(&self, provider: PayoutProvider) -> Option<&Arc<dyn SettlementProvider>> {
        self.adapters.get(&provider)
    }

    pub fn supports(&self, provider: PayoutProvider) -> bool {
        self.adapters.contains_key(&provider)
    }
}
