//! `NamespaceLabel` validation webhook handler
//!
//! Decision taxonomy:
//! - malformed JSON body: rejected by the extractor with HTTP 400;
//! - review that does not carry a request: `AdmissionResponse::invalid`
//!   (client error, not a policy denial);
//! - object using a blacklisted label key: denied, naming the key;
//! - everything else: allowed.

use std::sync::Arc;

use axum::{extract::State, Json};
use kube::core::{
    admission::{AdmissionRequest, AdmissionResponse, AdmissionReview},
    DynamicObject,
};
use tracing::{debug, error, info};

use crate::crds::NamespaceLabel;
use crate::labels::forbidden_key;

use super::WebhookState;

/// Handle a validating admission review for `NamespaceLabel` create/update
pub async fn validate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<NamespaceLabel>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let request: AdmissionRequest<NamespaceLabel> = match body.try_into() {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Malformed admission review");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    Json(validate(&state, &request).into_review())
}

fn validate(state: &WebhookState, request: &AdmissionRequest<NamespaceLabel>) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);

    let Some(nsl) = &request.object else {
        // No object to inspect (e.g. DELETE); nothing to gate.
        debug!(uid = %request.uid, "No object in request, allowing");
        return response;
    };

    match forbidden_key(&nsl.spec.labels, &state.blacklist) {
        Some(key) => {
            info!(
                uid = %request.uid,
                name = %request.name,
                key = %key,
                "Denying NamespaceLabel with blacklisted key"
            );
            response.deny(format!("label key {key:?} is blacklisted"))
        }
        None => {
            debug!(uid = %request.uid, name = %request.name, "NamespaceLabel allowed");
            response
        }
    }
}
