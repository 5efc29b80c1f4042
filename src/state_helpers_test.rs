use super::*;
use crate::data::memory::MemoryBackend;

/// Create a test `AppState` over a fresh in-process backend, returning
/// the backend too so tests can seed it and count calls.
#[must_use]
pub fn test_app_state() -> (AppState, Arc<MemoryBackend>) {
    test_app_state_with_payments(None)
}

/// Create a test `AppState` with a mock payment gateway.
#[must_use]
pub fn test_app_state_with_payments(payments: Option<Arc<dyn PaymentGateway>>) -> (AppState, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let state = AppState::new(backend.clone(), backend.clone(), payments, AppConfig::default());
    (state, backend)
}
