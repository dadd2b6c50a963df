//! Namespace reconciler: list, merge, full-replace.
//!
//! Always recomputes from currently listed state, never from the trigger
//! payload, so coalesced or stale triggers are harmless. The namespace's label
//! map is replaced wholesale with the merged result; labels not sourced from a
//! `NamespaceLabel` do not survive a reconcile. That full-replace behavior is
//! the contract of this operator, not an accident.

use crate::controllers::types::{Context, Error, Result};
use crate::crds::NamespaceLabel;
use crate::labels::{merge, LabelSet};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{ListParams, PostParams};
use kube::runtime::controller::Action;
use kube::{Api, Resource, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

#[instrument(skip(ctx), fields(namespace = %ns.name_any()))]
pub async fn reconcile(ns: Arc<Namespace>, ctx: Arc<Context>) -> Result<Action> {
    let name = ns.name_any();

    let requests: Api<NamespaceLabel> = Api::namespaced(ctx.client.clone(), &name);
    let listed = match requests.list(&ListParams::default()).await {
        Ok(list) => list.items,
        Err(kube::Error::Api(e)) if e.code == 404 => {
            // Namespace (or its scope) is already gone, nothing to converge.
            debug!("NamespaceLabel list returned 404, skipping");
            ctx.retries.clear(&name);
            return Ok(Action::await_change());
        }
        Err(e) => return Err(Error::KubeError(e)),
    };

    // Re-fetch rather than trusting the watch cache, so the update carries the
    // freshest resourceVersion we can get.
    let namespaces: Api<Namespace> = Api::all(ctx.client.clone());
    let mut namespace = match namespaces.get(&name).await {
        Ok(ns) => ns,
        Err(kube::Error::Api(e)) if e.code == 404 => {
            debug!("Namespace already deleted, skipping");
            ctx.retries.clear(&name);
            return Ok(Action::await_change());
        }
        Err(e) => return Err(Error::KubeError(e)),
    };

    let merged = desired_labels(&listed);
    info!(
        requests = listed.len(),
        labels = merged.len(),
        "Replacing namespace labels with merged NamespaceLabel state"
    );
    namespace.metadata.labels = Some(merged);

    match namespaces
        .replace(&name, &PostParams::default(), &namespace)
        .await
    {
        Ok(_) => {
            ctx.retries.clear(&name);
            Ok(Action::await_change())
        }
        Err(kube::Error::Api(e)) if e.code == 409 => {
            // Expected under concurrent writers; recompute on the next pass.
            debug!("Conflict updating namespace, requeueing");
            Ok(Action::requeue(Duration::from_secs(
                ctx.config.conflict_requeue_seconds,
            )))
        }
        Err(kube::Error::Api(e)) if e.code == 404 => {
            // Raced with namespace deletion between fetch and update.
            debug!("Namespace vanished during update, requeueing");
            Ok(Action::requeue(Duration::from_secs(
                ctx.config.conflict_requeue_seconds,
            )))
        }
        Err(e) => Err(Error::KubeError(e)),
    }
}

/// Compute the label set a namespace should carry from its `NamespaceLabel`s.
///
/// Objects already marked for deletion are excluded, so a deletion-triggered
/// reconcile converges even if the watch cache still lists the object. The
/// fold order is (creation time, name) to make colliding-key resolution
/// reproducible.
pub fn desired_labels(requests: &[NamespaceLabel]) -> LabelSet {
    let mut live: Vec<&NamespaceLabel> = requests
        .iter()
        .filter(|r| r.meta().deletion_timestamp.is_none())
        .collect();
    live.sort_by_key(|r| {
        (
            r.meta().creation_timestamp.as_ref().map(|t| t.0),
            r.name_any(),
        )
    });
    merge(live.into_iter().map(|r| r.spec.labels.clone()))
}

pub fn error_policy(ns: Arc<Namespace>, err: &Error, ctx: Arc<Context>) -> Action {
    let name = ns.name_any();
    let delay = ctx.retries.next_backoff(&name);
    error!(
        error = ?err,
        namespace = %name,
        retry_in = ?delay,
        "Namespace reconciliation failed"
    );
    Action::requeue(delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crds::NamespaceLabelSpec;
    use chrono::{TimeZone, Utc};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    fn request(name: &str, created_hour: u32, pairs: &[(&str, &str)]) -> NamespaceLabel {
        NamespaceLabel {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("ns1".to_string()),
                creation_timestamp: Some(Time(
                    Utc.with_ymd_and_hms(2025, 1, 1, created_hour, 0, 0).unwrap(),
                )),
                ..Default::default()
            },
            spec: NamespaceLabelSpec {
                labels: pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            },
        }
    }

    #[test]
    fn test_no_requests_yields_empty_labels() {
        assert!(desired_labels(&[]).is_empty());
    }

    #[test]
    fn test_disjoint_requests_union() {
        let merged = desired_labels(&[
            request("a", 1, &[("env", "prod")]),
            request("b", 2, &[("team", "infra")]),
        ]);
        assert_eq!(merged.get("env").unwrap(), "prod");
        assert_eq!(merged.get("team").unwrap(), "infra");
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_collision_resolved_by_creation_time() {
        // Listing order must not matter, only creation time.
        let older = request("zzz", 1, &[("env", "old")]);
        let newer = request("aaa", 2, &[("env", "new")]);

        let merged = desired_labels(&[newer.clone(), older.clone()]);
        assert_eq!(merged.get("env").unwrap(), "new");

        let merged = desired_labels(&[older, newer]);
        assert_eq!(merged.get("env").unwrap(), "new");
    }

    #[test]
    fn test_collision_tie_broken_by_name() {
        let first = request("aaa", 1, &[("env", "from-aaa")]);
        let second = request("bbb", 1, &[("env", "from-bbb")]);

        let merged = desired_labels(&[second, first]);
        assert_eq!(merged.get("env").unwrap(), "from-bbb");
    }

    #[test]
    fn test_requests_marked_for_deletion_are_ignored() {
        let mut doomed = request("a", 1, &[("env", "prod")]);
        doomed.metadata.deletion_timestamp =
            Some(Time(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()));
        let kept = request("b", 2, &[("team", "infra")]);

        let merged = desired_labels(&[doomed, kept]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get("team").unwrap(), "infra");
    }
}
