//! Validating Admission Webhook
//!
//! Gates create/update of `NamespaceLabel` objects on the configured label-key
//! blacklist before anything is persisted. The gate only inspects the incoming
//! object and returns a decision; it never mutates and it needs no Kubernetes
//! client. TLS is terminated in front of this service.

pub mod namespacelabel;

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{routing::post, Router};

/// Shared state for webhook handlers
#[derive(Clone)]
pub struct WebhookState {
    /// Forbidden label keys, injected at construction and read-only after
    pub blacklist: BTreeSet<String>,
}

impl WebhookState {
    pub fn new(blacklist: BTreeSet<String>) -> Self {
        Self { blacklist }
    }
}

/// Create the webhook router with all validation endpoints
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(
            "/validate-dana-io-v1-namespacelabel",
            post(namespacelabel::validate_handler),
        )
        .with_state(state)
}
