use std::sync::{Arc, RwLock};

use eventplan_core::events::DomainEventSink;
use eventplan_core::reconciliation::ReconciliationService;
use eventplan_storage_memory::{MemoryStore, WriteHandle};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::domain_events::TracingDomainEventSink;

pub struct AppState {
    pub store: MemoryStore,
    pub reconciliation_service: Arc<ReconciliationService<WriteHandle>>,
}

/// Logs go to stderr so stdout carries only step results.
pub fn init_tracing() {
    let log_format = std::env::var("EP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn build_state(config: &Config) -> AppState {
    let store = MemoryStore::open();
    tracing::info!(
        "Ledger ready (base currency {}, reject overpayment: {}, auto-advance on deposit: {})",
        config.settings.base_currency,
        config.settings.reject_budget_overpayment,
        config.settings.auto_advance_on_deposit
    );
    let event_sink: Arc<dyn DomainEventSink> = Arc::new(TracingDomainEventSink);
    let reconciliation_service = ReconciliationService::new(
        store.booking_repository(),
        store.budget_repository(),
        store.payment_repository(),
        store.writer(),
        Arc::new(RwLock::new(config.settings.clone())),
    )
    .with_event_sink(event_sink);

    AppState {
        store,
        reconciliation_service: Arc::new(reconciliation_service),
    }
}
