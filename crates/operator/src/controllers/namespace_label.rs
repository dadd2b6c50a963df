//! `NamespaceLabel` reconciler: fan-in only.
//!
//! This controller never merges and never touches namespaces. Its whole job is
//! to collapse fine-grained `NamespaceLabel` changes into namespace-granularity
//! triggers on the bus. A finalizer guarantees that a deletion also produces a
//! trigger while the object still exists (with a deletion timestamp), so the
//! Namespace reconciler observes the removal no matter how the watch and list
//! races resolve.

use crate::controllers::types::{Context, Error, Result};
use crate::crds::NamespaceLabel;
use kube::runtime::controller::Action;
use kube::runtime::finalizer::{finalizer, Event as FinalizerEvent};
use kube::{Api, ResourceExt};
use std::sync::Arc;
use tracing::{debug, error, instrument};

pub const FINALIZER_NAME: &str = "namespacelabels.dana.io/retrigger";

#[instrument(skip(ctx), fields(name = %nsl.name_any(), namespace = ?nsl.namespace()))]
pub async fn reconcile(nsl: Arc<NamespaceLabel>, ctx: Arc<Context>) -> Result<Action> {
    let namespace = nsl.namespace().ok_or(Error::MissingNamespace)?;
    let key = format!("{}/{}", namespace, nsl.name_any());

    let api: Api<NamespaceLabel> = Api::namespaced(ctx.client.clone(), &namespace);
    let result = finalizer(&api, FINALIZER_NAME, nsl, |event| async {
        match event {
            FinalizerEvent::Apply(obj) => publish_trigger(&obj, &ctx).await,
            FinalizerEvent::Cleanup(obj) => publish_trigger(&obj, &ctx).await,
        }
    })
    .await
    .map_err(|e| match e {
        kube::runtime::finalizer::Error::ApplyFailed(err) => err,
        kube::runtime::finalizer::Error::CleanupFailed(err) => err,
        kube::runtime::finalizer::Error::AddFinalizer(e) => Error::KubeError(e),
        kube::runtime::finalizer::Error::RemoveFinalizer(e) => Error::KubeError(e),
        kube::runtime::finalizer::Error::UnnamedObject => Error::MissingObjectKey,
        kube::runtime::finalizer::Error::InvalidFinalizer => {
            Error::ConfigError("Invalid finalizer name".to_string())
        }
    })?;

    ctx.retries.clear(&key);
    Ok(result)
}

/// Publish a trigger for the owning namespace. Blocks while the bus is full;
/// fails (and is retried with backoff) if the bus was torn down first.
async fn publish_trigger(nsl: &NamespaceLabel, ctx: &Context) -> Result<Action> {
    let namespace = nsl.namespace().ok_or(Error::MissingNamespace)?;
    ctx.bus
        .publish(&namespace)
        .await
        .map_err(|_| Error::TriggerBusClosed)?;
    debug!(namespace = %namespace, "Namespace trigger published");
    Ok(Action::await_change())
}

pub fn error_policy(nsl: Arc<NamespaceLabel>, err: &Error, ctx: Arc<Context>) -> Action {
    let key = format!(
        "{}/{}",
        nsl.namespace().unwrap_or_default(),
        nsl.name_any()
    );
    let delay = ctx.retries.next_backoff(&key);
    error!(
        error = ?err,
        name = %nsl.name_any(),
        retry_in = ?delay,
        "NamespaceLabel reconciliation failed"
    );
    Action::requeue(delay)
}
