//! `NamespaceLabel` Custom Resource Definition
//!
//! A namespaced request for labels to be applied to the owning namespace. The
//! Namespace controller merges the `spec.labels` of every `NamespaceLabel` in a
//! namespace onto the live Namespace object.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(group = "dana.io", version = "v1", kind = "NamespaceLabel")]
#[kube(namespaced)]
#[kube(printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#)]
pub struct NamespaceLabelSpec {
    /// Labels this request contributes to the owning namespace
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}
