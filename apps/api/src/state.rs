use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::forms::runtime::SubmitSink;
use crate::forms::store::{FormRepository, MemoryFormRepository, RepositorySink};
use crate::integrations::store::{IntegrationStore, MemoryIntegrationStore};
use crate::integrations::tester::IntegrationTester;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub forms: Arc<dyn FormRepository>,
    pub integrations: Arc<dyn IntegrationStore>,
    /// Where validated submissions go: the local repository or the remote forms API.
    pub submit_sink: Arc<dyn SubmitSink>,
    pub tester: IntegrationTester,
    pub config: Config,
}

impl AppState {
    /// State backed entirely by in-memory stores.
    pub fn in_memory(config: Config) -> Self {
        let forms: Arc<dyn FormRepository> = Arc::new(MemoryFormRepository::new());
        Self {
            submit_sink: Arc::new(RepositorySink(forms.clone())),
            forms,
            integrations: Arc::new(MemoryIntegrationStore::new()),
            tester: IntegrationTester::new(Duration::from_secs(
                config.integration_test_timeout_secs,
            )),
            config,
        }
    }
}
