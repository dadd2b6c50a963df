//! Controller wiring
//!
//! Two controllers run concurrently on the shared trigger bus:
//!
//! - the `NamespaceLabel` controller (producer) publishes a namespace trigger
//!   for every `NamespaceLabel` change, including deletions via its finalizer;
//! - the Namespace controller (consumer) reconciles on those triggers and on
//!   direct Namespace changes, so out-of-band label edits are re-converged.
//!
//! `kube-runtime` provides the load-bearing scheduling guarantees: duplicate
//! keys coalesce while pending, and at most one reconcile per key is in
//! flight at any time.

use crate::config::OperatorConfig;
use crate::crds::NamespaceLabel;
use crate::trigger::trigger_bus;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Namespace;
use kube::runtime::controller::Controller;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::{Api, Client};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

pub mod namespace;
pub mod namespace_label;
pub mod types;

pub use types::{Context, Error, Result};

/// Run both controllers until shutdown.
///
/// The trigger bus is created before either controller starts. The producer
/// side lives in the shared [`Context`]; when both controller futures finish
/// on shutdown the last sender drops and the bus closes, in that order.
#[instrument(skip(client, config))]
pub async fn run_controllers(client: Client, config: Arc<OperatorConfig>) -> Result<()> {
    info!("Starting NamespaceLabel and Namespace controllers");

    let (bus, triggers) = trigger_bus(config.trigger_capacity);
    let ctx = Arc::new(Context::new(client.clone(), config, bus));

    let label_requests: Api<NamespaceLabel> = Api::all(client.clone());
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let watcher_config = WatcherConfig::default().any_semantic();

    let label_controller = Controller::new(label_requests, watcher_config.clone())
        .shutdown_on_signal()
        .run(
            namespace_label::reconcile,
            namespace_label::error_policy,
            ctx.clone(),
        )
        .for_each(|result| async move {
            match result {
                Ok(obj) => debug!(resource = ?obj, "NamespaceLabel reconciliation successful"),
                Err(e) => error!(error = ?e, "NamespaceLabel reconciliation error"),
            }
        });

    let namespace_controller = Controller::new(namespaces, watcher_config)
        .reconcile_on(triggers)
        .shutdown_on_signal()
        .run(namespace::reconcile, namespace::error_policy, ctx.clone())
        .for_each(|result| async move {
            match result {
                Ok(obj) => debug!(resource = ?obj, "Namespace reconciliation successful"),
                Err(kube::runtime::controller::Error::ObjectNotFound(obj_ref)) => {
                    // A trigger can outlive its namespace; nothing to do.
                    debug!(resource = %obj_ref, "Trigger for missing namespace, ignoring");
                }
                Err(e) => error!(error = ?e, "Namespace reconciliation error"),
            }
        });

    // Run to completion; both futures resolve once the shutdown signal fires
    // and in-flight reconciles drain.
    tokio::join!(label_controller, namespace_controller);

    info!("Controllers shut down");
    Ok(())
}
