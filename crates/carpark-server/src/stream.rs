//! Log stream sessions: one hub subscription relayed to one remote caller.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;

use carpark_core::prelude::*;

use crate::hub::{BroadcastHub, Subscription};
use crate::proto::pb;

/// Item type handed to the transport
pub type LogStreamItem = std::result::Result<pb::LogMessage, Status>;

/// Open a log stream session.
///
/// Subscribes to `hub` immediately, so every line published after this call
/// returns is delivered. A background task relays messages into a channel of
/// `buffer` slots that the transport drains; the session ends (and
/// unsubscribes) when the caller goes away.
pub fn open_log_stream(hub: &BroadcastHub, buffer: usize) -> ReceiverStream<LogStreamItem> {
    let subscription = hub.subscribe();
    let (tx, rx) = mpsc::channel(buffer.max(1));
    tokio::spawn(run_session(subscription, tx));
    ReceiverStream::new(rx)
}

async fn run_session(mut subscription: Subscription, tx: mpsc::Sender<LogStreamItem>) {
    let subscriber = subscription.id();
    info!(subscriber, "Log stream opened");

    let mut relayed: u64 = 0;
    loop {
        tokio::select! {
            message = subscription.recv() => {
                let Some(message) = message else {
                    debug!(subscriber, "hub closed the subscription");
                    break;
                };
                if tx.send(Ok(message.into())).await.is_err() {
                    break;
                }
                relayed += 1;
            }
            _ = tx.closed() => break,
        }
    }

    drop(subscription);
    info!(subscriber, relayed, "Log stream closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use carpark_core::{InvocationId, LogMessage};
    use std::time::Duration;
    use tokio_stream::StreamExt;

    async fn wait_for_subscribers(hub: &BroadcastHub, expected: usize) {
        for _ in 0..200 {
            if hub.subscriber_count() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "expected {} subscribers, have {}",
            expected,
            hub.subscriber_count()
        );
    }

    #[tokio::test]
    async fn test_stream_relays_published_lines() {
        let hub = BroadcastHub::new();
        let mut stream = open_log_stream(&hub, 4);
        let id = InvocationId::new();

        for text in ["10", "20", "30"] {
            hub.publish(LogMessage::new(id, text));
        }

        let mut received = Vec::new();
        for _ in 0..3 {
            let item = tokio::time::timeout(Duration::from_secs(2), stream.next())
                .await
                .expect("stream stalled")
                .expect("stream ended")
                .expect("status error");
            received.push(item.text);
        }
        assert_eq!(received, vec!["10", "20", "30"]);
    }

    #[tokio::test]
    async fn test_small_buffer_keeps_order() {
        let hub = BroadcastHub::new();
        let mut stream = open_log_stream(&hub, 1);
        let id = InvocationId::new();

        for i in 0..50 {
            hub.publish(LogMessage::new(id, i.to_string()));
        }

        let mut received = Vec::new();
        while received.len() < 50 {
            let item = tokio::time::timeout(Duration::from_secs(2), stream.next())
                .await
                .expect("stream stalled")
                .unwrap()
                .unwrap();
            received.push(item.text);
        }
        let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn test_disconnect_unsubscribes_while_idle() {
        let hub = BroadcastHub::new();
        let stream = open_log_stream(&hub, 4);
        assert_eq!(hub.subscriber_count(), 1);

        drop(stream);
        wait_for_subscribers(&hub, 0).await;
    }

    #[tokio::test]
    async fn test_disconnect_does_not_affect_other_streams() {
        let hub = BroadcastHub::new();
        let first = open_log_stream(&hub, 4);
        let mut second = open_log_stream(&hub, 4);

        drop(first);
        wait_for_subscribers(&hub, 1).await;

        hub.publish(LogMessage::new(InvocationId::new(), "still here"));
        let item = tokio::time::timeout(Duration::from_secs(2), second.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(item.text, "still here");
    }
}
