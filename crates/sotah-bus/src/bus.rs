use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_nats::Client;
use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use sotah_model::MAX_TOPIC_BATCH;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::envelope::Envelope;
use crate::Error;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BULK_TIMEOUT: Duration = Duration::from_secs(60);

/// Thin wrapper over an `async_nats::Client` implementing the two
/// transports spec.md Section 4.7 requires: subject-addressed
/// request/reply, and topic/subscription with bulk publish-then-await.
#[derive(Clone)]
pub struct Bus {
    client: Client,
}

impl Bus {
    pub async fn connect(host: &str, port: u16) -> Result<Self, Error> {
        let url = format!("{host}:{port}");
        let client = async_nats::connect(&url).await.map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Bus { client })
    }

    pub fn from_client(client: Client) -> Self {
        Bus { client }
    }

    /// Request/reply with the default 5s deadline (spec.md Section 4.7).
    pub async fn request(&self, subject: &str, payload: Bytes) -> Result<Envelope, Error> {
        self.request_with_timeout(subject, payload, DEFAULT_REQUEST_TIMEOUT).await
    }

    pub async fn request_with_timeout(
        &self,
        subject: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<Envelope, Error> {
        let fut = self.client.request(subject.to_string(), payload);
        let message = tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::Timeout {
                subject: subject.to_string(),
            })?
            .map_err(|e| Error::Transport(e.to_string()))?;

        serde_json::from_slice(&message.payload).map_err(Error::Decode)
    }

    /// Publishes `payload` to `subject` without awaiting a reply.
    pub async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), Error> {
        self.client
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }

    /// Bulk fan-out: publishes one message per item (chunked at
    /// `MAX_TOPIC_BATCH`), each addressed to a distinct reply subject,
    /// and awaits every reply under one outer 60s deadline (spec.md
    /// Section 4.7, "bulk fan-out").
    pub async fn publish_and_await_all(
        &self,
        topic: &str,
        items: Vec<Bytes>,
    ) -> Result<Vec<Envelope>, Error> {
        self.publish_and_await_all_with_timeout(topic, items, DEFAULT_BULK_TIMEOUT).await
    }

    pub async fn publish_and_await_all_with_timeout(
        &self,
        topic: &str,
        items: Vec<Bytes>,
        timeout: Duration,
    ) -> Result<Vec<Envelope>, Error> {
        let chunks: Vec<&[Bytes]> = items.chunks(MAX_TOPIC_BATCH).collect();
        if chunks.len() > 1 {
            info!(topic, chunks = chunks.len(), "chunking bulk publish over batch limit");
        }

        let requests = FuturesUnordered::new();
        for chunk in chunks {
            for item in chunk {
                requests.push(self.request(topic, item.clone()));
            }
        }

        let fut = requests.collect::<Vec<_>>();
        let results = tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::Timeout { subject: topic.to_string() })?;

        results.into_iter().collect()
    }

    /// Starts a durable subscription on `subject`, invoking `handler`
    /// for every message and replying with its returned envelope.
    /// Returns a handle whose `stop()` synchronously unsubscribes and
    /// awaits the in-flight callback (spec.md Section 4.7, "Cancellation").
    pub async fn listen<F, Fut>(&self, subject: &str, handler: F) -> Result<Listener, Error>
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Envelope> + Send,
    {
        let mut subscription = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let client = self.client.clone();
        let handler = Arc::new(handler);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let subject_owned = subject.to_string();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        break;
                    }
                    message = subscription.next() => {
                        let Some(message) = message else { break };
                        let Some(reply) = message.reply.clone() else { continue };
                        let envelope = handler(message.payload.clone()).await;
                        match serde_json::to_vec(&envelope) {
                            Ok(body) => {
                                if let Err(error) = client.publish(reply, body.into()).await {
                                    warn!(subject = %subject_owned, %error, "failed to publish reply");
                                }
                            }
                            Err(error) => warn!(subject = %subject_owned, %error, "failed to encode reply envelope"),
                        }
                    }
                }
            }
        });

        Ok(Listener {
            stop_tx: Some(stop_tx),
            task: Some(task),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_publish_chunks_at_batch_limit() {
        let items: Vec<Bytes> = (0..2_500).map(|_| Bytes::from_static(b"x")).collect();
        let chunks: Vec<&[Bytes]> = items.chunks(MAX_TOPIC_BATCH).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), MAX_TOPIC_BATCH);
        assert_eq!(chunks[1].len(), MAX_TOPIC_BATCH);
        assert_eq!(chunks[2].len(), 500);
    }
}

/// Handle to a running subscription; dropping without calling `stop()`
/// leaves the subscription running until the process exits.
pub struct Listener {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Listener {
    /// Synchronously unsubscribes and awaits completion of any
    /// in-flight callback before returning (spec.md Section 4.7).
    pub async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}
