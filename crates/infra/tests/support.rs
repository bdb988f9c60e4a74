//! Shared fixtures for the API client integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dropdoko_common::testing::MockCredentialStore;
use dropdoko_infra::{ApiClient, ApiClientConfig, SessionHandle};
use parking_lot::Mutex;
use wiremock::MockServer;

pub const CREDENTIAL_KEY: &str = "dropdoko.access_token";
pub const SERVICE_HEADER: &str = "x-api-key";
pub const SERVICE_TOKEN: &str = "svc-test-token";

/// Counts and records every termination signal.
#[derive(Debug, Clone, Default)]
pub struct TerminationProbe {
    count: Arc<AtomicUsize>,
    reasons: Arc<Mutex<Vec<String>>>,
}

impl TerminationProbe {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn reasons(&self) -> Vec<String> {
        self.reasons.lock().clone()
    }
}

/// A client wired to a mock backend, its store and its termination probe.
pub struct TestClient {
    pub client: Arc<ApiClient>,
    pub store: MockCredentialStore,
    pub terminations: TerminationProbe,
}

/// Build a client against `server`, optionally signed in with `token`.
pub async fn client_for(server: &MockServer, token: Option<&str>) -> TestClient {
    let store = match token {
        Some(token) => MockCredentialStore::with_credential(CREDENTIAL_KEY, token),
        None => MockCredentialStore::new(),
    };

    let terminations = TerminationProbe::default();
    let probe = terminations.clone();
    let session = SessionHandle::new(Arc::new(store.clone()), CREDENTIAL_KEY)
        .with_termination_handler(Arc::new(move |reason: &str| {
            probe.count.fetch_add(1, Ordering::SeqCst);
            probe.reasons.lock().push(reason.to_string());
        }));
    session.restore().await.expect("mock store never fails to load");

    let config = ApiClientConfig {
        base_url: server.uri(),
        service_header: SERVICE_HEADER.to_string(),
        service_token: SERVICE_TOKEN.to_string(),
        ..Default::default()
    };
    let client = ApiClient::new(config, Arc::new(session)).expect("client should build");

    TestClient { client: Arc::new(client), store, terminations }
}

/// Number of requests the mock backend received for `path`.
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == path)
        .count()
}
