//! Application state

use artacore_auth::{Authenticator, Policy, RequestGate};
use artacore_db::Database;
use artacore_storage::StorageBackend;
use std::sync::Arc;

/// Prometheus handle used to render `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub authenticator: Arc<Authenticator>,
    pub gate: Arc<RequestGate>,
    pub policy: Arc<dyn Policy>,
    pub storage: Arc<dyn StorageBackend>,
    /// Public URL prefix uploaded files are served under
    pub public_url_prefix: String,
    pub max_upload_bytes: usize,
    pub allow_registration: bool,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Database,
        authenticator: Arc<Authenticator>,
        gate: Arc<RequestGate>,
        policy: Arc<dyn Policy>,
        storage: Arc<dyn StorageBackend>,
        public_url_prefix: String,
        max_upload_bytes: usize,
        allow_registration: bool,
    ) -> Self {
        Self {
            db,
            authenticator,
            gate,
            policy,
            storage,
            public_url_prefix,
            max_upload_bytes,
            allow_registration,
        }
    }
}
