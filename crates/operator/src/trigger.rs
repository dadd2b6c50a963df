//! Trigger bus: cross-resource fan-in channel
//!
//! `NamespaceLabel` changes happen at (namespace, name) granularity but
//! convergence happens at namespace granularity. The bus carries
//! `ObjectRef<Namespace>` triggers from the `NamespaceLabel` reconciler to the
//! Namespace controller, whose scheduler coalesces duplicate keys that are
//! already pending.
//!
//! The channel is bounded; a full bus blocks the publisher rather than drop a
//! convergence trigger. It closes when every `TriggerBus` clone is dropped,
//! which only happens after the producing controller has stopped, so a send
//! after close cannot occur in normal operation and is surfaced as an error
//! (and retried) if shutdown races a reconcile.

use k8s_openapi::api::core::v1::Namespace;
use kube::runtime::reflector::ObjectRef;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// The bus was torn down before the trigger could be delivered
#[derive(Debug, Error)]
#[error("trigger bus closed")]
pub struct TriggerBusClosed;

/// Producer half of the trigger bus
#[derive(Clone)]
pub struct TriggerBus {
    tx: mpsc::Sender<ObjectRef<Namespace>>,
}

/// Create a bounded trigger bus, returning the producer handle and the stream
/// the Namespace controller consumes.
pub fn trigger_bus(capacity: usize) -> (TriggerBus, ReceiverStream<ObjectRef<Namespace>>) {
    let (tx, rx) = mpsc::channel(capacity);
    (TriggerBus { tx }, ReceiverStream::new(rx))
}

impl TriggerBus {
    /// Publish a trigger for the given namespace, waiting for capacity if the
    /// bus is full.
    pub async fn publish(&self, namespace: &str) -> Result<(), TriggerBusClosed> {
        debug!(namespace = %namespace, "Publishing namespace trigger");
        self.tx
            .send(ObjectRef::new(namespace))
            .await
            .map_err(|_| TriggerBusClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_publish_delivers_namespace_ref() {
        let (bus, mut triggers) = trigger_bus(4);

        bus.publish("ns1").await.unwrap();
        let trigger = triggers.next().await.unwrap();
        assert_eq!(trigger.name, "ns1");
    }

    #[tokio::test]
    async fn test_triggers_arrive_in_publish_order() {
        let (bus, mut triggers) = trigger_bus(4);

        bus.publish("ns1").await.unwrap();
        bus.publish("ns2").await.unwrap();
        bus.publish("ns1").await.unwrap();

        let names: Vec<String> = vec![
            triggers.next().await.unwrap().name,
            triggers.next().await.unwrap().name,
            triggers.next().await.unwrap().name,
        ];
        assert_eq!(names, ["ns1", "ns2", "ns1"]);
    }

    #[tokio::test]
    async fn test_publish_after_consumer_drop_fails() {
        let (bus, triggers) = trigger_bus(4);
        drop(triggers);

        assert!(bus.publish("ns1").await.is_err());
    }

    #[tokio::test]
    async fn test_full_bus_blocks_until_drained() {
        let (bus, mut triggers) = trigger_bus(1);

        bus.publish("ns1").await.unwrap();

        let pending = {
            let bus = bus.clone();
            tokio::spawn(async move { bus.publish("ns2").await })
        };
        // The second publish cannot complete until the first is dequeued.
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        assert_eq!(triggers.next().await.unwrap().name, "ns1");
        pending.await.unwrap().unwrap();
        assert_eq!(triggers.next().await.unwrap().name, "ns2");
    }
}
