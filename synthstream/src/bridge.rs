// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! External telemetry bridge.
//!
//! Translates a push-based publish/subscribe feed into the engine's
//! timer-based emission model. Inbound messages only update the tracked
//! scalar; the timer alone appends rows and emits, so the stream keeps its
//! cadence whether the feed is silent, slow, or never connected at all.
//!
//! Failure policy: connect/subscribe errors are logged and the producer
//! carries on with its last known (initially default) value; malformed or
//! non-matching messages are logged and dropped. Nothing on the feed path
//! is ever fatal to the stream, and nothing is retried.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use synthstream_core::{
    CircularFrame, FieldType, RequestContext, Result, SharedFrame, StreamConfig, StreamEvent,
    StreamItem, StreamType, Value,
};

use crate::engine::StreamHandle;
use crate::feed::{FeedConnection, FeedConnector, FeedMessage};
use crate::util::now_millis;

/// Delay before the bridge's first emission.
const FIRST_EMIT_DELAY: Duration = Duration::from_millis(500);

/// Fixed parameters of the external feed, injected into the engine.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// `host:port` of the feed endpoint.
    pub endpoint: String,
    /// Topic namespace; the subscribed topic is `"<namespace>/<device>"`.
    pub topic_namespace: String,
    /// Template expression resolved against the request's scoped variables
    /// to pick the device segment of the topic.
    pub topic_var: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:9155".to_owned(),
            topic_namespace: "big_data".to_owned(),
            topic_var: "$device".to_owned(),
        }
    }
}

pub struct BridgeProducer {
    connector: Arc<dyn FeedConnector>,
    endpoint: String,
    topic: String,
    mappings: HashMap<String, String>,
    field_selector: String,
    frame: SharedFrame,
    key: String,
    interval: Duration,
    value: f64,
}

impl BridgeProducer {
    pub fn new(
        connector: Arc<dyn FeedConnector>,
        settings: BridgeSettings,
        mappings: HashMap<String, String>,
        config: &StreamConfig,
        ctx: &RequestContext,
    ) -> Result<Self> {
        let mut frame = CircularFrame::new(
            ctx.max_rows,
            &ctx.ref_id,
            ctx.display_name(StreamType::External),
        );
        frame.add_field("time", FieldType::Time)?;
        frame.add_field("value", FieldType::Number)?;

        let device = ctx.resolve_var(&settings.topic_var).to_owned();
        Ok(Self {
            connector,
            endpoint: settings.endpoint,
            topic: format!("{}/{device}", settings.topic_namespace),
            mappings,
            field_selector: config.field_selector.clone(),
            frame: frame.into_shared(),
            key: ctx.stream_key(StreamType::External),
            interval: Duration::from_millis(config.update_interval_ms),
            value: 0.0,
        })
    }

    pub fn frame(&self) -> SharedFrame {
        self.frame.clone()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The topic this producer subscribes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn spawn(self) -> StreamHandle {
        StreamHandle::spawn(self.key.clone(), move |tx, token| self.run(tx, token))
    }

    async fn run(mut self, tx: UnboundedSender<StreamItem>, token: CancellationToken) {
        // Connection handshake is a suspension point: cancellation must not
        // wait for it. The half-open connection is simply dropped.
        let mut connection = tokio::select! {
            () = token.cancelled() => return,
            connection = self.open_feed() => connection,
        };

        let tick = tokio::time::sleep(FIRST_EMIT_DELAY);
        tokio::pin!(tick);
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                () = &mut tick => {
                    let row = vec![Value::Time(now_millis()), Value::Number(self.value)];
                    if let Err(error) = self.frame.write().add_row(row) {
                        warn!(key = %self.key, %error, "dropping bridge row");
                    }
                    if token.is_cancelled() {
                        break;
                    }
                    if tx
                        .send(Ok(StreamEvent::streaming(self.frame.clone(), &self.key)))
                        .is_err()
                    {
                        debug!(key = %self.key, "subscriber gone, stopping bridge stream");
                        break;
                    }
                    tick.as_mut().reset(Instant::now() + self.interval);
                }
                payload = next_feed_message(&mut connection) => {
                    match payload {
                        Some(payload) => self.ingest(&payload),
                        None => {
                            // Feed gone; keep emitting the last known value.
                            warn!(key = %self.key, topic = %self.topic, "feed closed, no reconnect");
                            connection = None;
                        }
                    }
                }
            }
        }
        if let Some(mut connection) = connection {
            connection.close().await;
        }
    }

    async fn open_feed(&self) -> Option<Box<dyn FeedConnection>> {
        let mut connection = match self.connector.connect(&self.endpoint).await {
            Ok(connection) => connection,
            Err(error) => {
                warn!(key = %self.key, endpoint = %self.endpoint, %error, "feed connect failed");
                return None;
            }
        };
        if let Err(error) = connection.subscribe(&self.topic).await {
            warn!(key = %self.key, topic = %self.topic, %error, "feed subscribe failed");
            connection.close().await;
            return None;
        }
        Some(connection)
    }

    /// Apply one inbound message to the tracked value. Never fails the
    /// stream: anything malformed or non-matching is logged and dropped.
    fn ingest(&mut self, payload: &Bytes) {
        let message: FeedMessage = match serde_json::from_slice(payload) {
            Ok(message) => message,
            Err(error) => {
                warn!(key = %self.key, %error, "ignoring malformed feed message");
                return;
            }
        };
        let Some(expected_target) = self.mappings.get(&self.field_selector) else {
            debug!(key = %self.key, field = %self.field_selector, "no mapping for field");
            return;
        };
        if message.target != *expected_target {
            debug!(
                key = %self.key,
                target = %message.target,
                "ignoring message for other target"
            );
            return;
        }
        match message.fields.get(&self.field_selector) {
            Some(value) => self.value = *value,
            None => {
                warn!(
                    key = %self.key,
                    field = %self.field_selector,
                    "matching message lacks selected field"
                );
            }
        }
    }
}

/// Wait for a message on the connection, or forever when there is none.
async fn next_feed_message(connection: &mut Option<Box<dyn FeedConnection>>) -> Option<Bytes> {
    match connection.as_mut() {
        Some(connection) => connection.next_message().await,
        None => std::future::pending().await,
    }
}
