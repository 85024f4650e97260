// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Stream dispatch and producer lifetime management.
//!
//! [`StreamEngine`] is the composition root: it owns the injected feed
//! connector, bridge settings, field→target mapping table, HTTP client and
//! log line source, and dispatches each query to exactly one producer.
//! Configuration problems (unknown type, missing URL, invalid tunables)
//! fail here, before any timer, connection or request exists.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};

use synthstream_core::{RequestContext, Result, StreamError, StreamItem, StreamQuery, StreamType};

use crate::bridge::{BridgeProducer, BridgeSettings};
use crate::chunk_source::HttpChunkSource;
use crate::chunked::ChunkedProducer;
use crate::feed::FeedConnector;
use crate::logs::{IpsumLines, LineSource, LogsProducer};
use crate::signal::SignalProducer;
use crate::tcp::TcpFeedConnector;

/// The default field→target mapping used by the telemetry bridge: a feed
/// message updates the tracked value only when its `target` tag matches the
/// entry for the configured field selector.
pub fn default_field_mappings() -> HashMap<String, String> {
    [
        ("speed", "vehicle_status"),
        ("rpm", "vehicle_engine"),
        ("engaged_manual", "vehicle_gear"),
        ("throttle", "vehicle_pedal"),
        ("brake_pressure", "vehicle_pedal"),
        ("latitude", "vehicle_position"),
        ("longitude", "vehicle_position"),
        ("torque", "vehicle_engine"),
    ]
    .into_iter()
    .map(|(field, target)| (field.to_owned(), target.to_owned()))
    .collect()
}

/// Composition root for stream dispatch.
pub struct StreamEngine {
    connector: Arc<dyn FeedConnector>,
    bridge: BridgeSettings,
    mappings: HashMap<String, String>,
    http: reqwest::Client,
    lines: Arc<dyn LineSource>,
}

impl Default for StreamEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamEngine {
    pub fn new() -> Self {
        Self {
            connector: Arc::new(TcpFeedConnector),
            bridge: BridgeSettings::default(),
            mappings: default_field_mappings(),
            http: reqwest::Client::new(),
            lines: Arc::new(IpsumLines::default()),
        }
    }

    /// Replace the feed connector used by bridge streams.
    pub fn with_connector(mut self, connector: Arc<dyn FeedConnector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_bridge_settings(mut self, settings: BridgeSettings) -> Self {
        self.bridge = settings;
        self
    }

    /// Replace the field→target mapping table used by bridge streams.
    pub fn with_mappings(mut self, mappings: HashMap<String, String>) -> Self {
        self.mappings = mappings;
        self
    }

    pub fn with_line_source(mut self, lines: Arc<dyn LineSource>) -> Self {
        self.lines = lines;
        self
    }

    /// Resolve the query and start exactly one producer for it.
    ///
    /// Fails fast with a setup error for unrecognized stream types and for
    /// chunked queries without a URL; no resource is acquired in that case.
    /// The returned handle is the producer's single subscriber: dropping it
    /// (or calling [`StreamHandle::cancel`]) tears the producer down.
    pub fn run_stream(&self, query: &StreamQuery, ctx: &RequestContext) -> Result<StreamHandle> {
        let config = query.resolve()?;
        match config.stream_type {
            StreamType::Signal => {
                let producer = SignalProducer::new(&config, ctx)?;
                Ok(producer.spawn())
            }
            StreamType::Logs => {
                let producer = LogsProducer::new(&config, ctx, self.lines.clone())?;
                Ok(producer.spawn())
            }
            StreamType::External => {
                let producer = BridgeProducer::new(
                    self.connector.clone(),
                    self.bridge.clone(),
                    self.mappings.clone(),
                    &config,
                    ctx,
                )?;
                Ok(producer.spawn())
            }
            StreamType::Chunked => {
                let url = config.url.clone().ok_or(StreamError::MissingUrl)?;
                let producer = ChunkedProducer::new(ctx);
                let client = self.http.clone();
                Ok(StreamHandle::spawn(
                    producer.key().to_owned(),
                    move |tx, token| async move {
                        // The single request of this stream's lifetime; a
                        // failure here is terminal, not retried.
                        let source = tokio::select! {
                            () = token.cancelled() => return,
                            source = HttpChunkSource::open(&client, &url) => source,
                        };
                        match source {
                            Ok(source) => producer.run(source, tx, token).await,
                            Err(error) => {
                                let _ = tx.send(Err(error));
                            }
                        }
                    },
                ))
            }
        }
    }
}

/// Subscriber half of a running producer.
///
/// Holds the emission channel, the cancellation token, and the producer
/// task. Cancellation is cooperative and idempotent; dropping the handle
/// cancels as well, so no producer outlives its only subscriber.
#[derive(Debug)]
pub struct StreamHandle {
    key: String,
    events: UnboundedReceiver<StreamItem>,
    token: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<()>,
}

impl StreamHandle {
    pub(crate) fn spawn<F, Fut>(key: String, producer: F) -> Self
    where
        F: FnOnce(UnboundedSender<StreamItem>, CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, events) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let task = tokio::spawn(producer(tx, token.clone()));
        Self {
            key,
            events,
            guard: token.clone().drop_guard(),
            token,
            task,
        }
    }

    /// Stable stream key: `"<variant>-<requestId>-<correlationId>"`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Signal teardown. Idempotent.
    ///
    /// Cancellation is cooperative: the producer stops at its next
    /// cancellation check, so an emission already past that check may still
    /// be delivered. Emissions buffered before the stop stay receivable
    /// until the channel drains to a close.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Receive the next emission. `None` once the producer has stopped and
    /// every buffered emission has been drained.
    pub async fn recv(&mut self) -> Option<StreamItem> {
        self.events.recv().await
    }

    /// Wait for the producer task to finish. Usually preceded by
    /// [`cancel`](Self::cancel); chunked producers also stop on their own.
    pub async fn until_stopped(&mut self) {
        let _ = (&mut self.task).await;
    }

    /// Consume the handle into a `Stream` of emissions.
    ///
    /// The producer stays alive for as long as the returned stream is held;
    /// dropping the stream cancels it, exactly as dropping the handle would.
    pub fn into_stream(self) -> EventStream {
        EventStream {
            inner: UnboundedReceiverStream::new(self.events),
            _guard: self.guard,
        }
    }
}

/// Emission stream returned by [`StreamHandle::into_stream`]. Cancels the
/// producer when dropped.
pub struct EventStream {
    inner: UnboundedReceiverStream<StreamItem>,
    _guard: DropGuard,
}

impl Stream for EventStream {
    type Item = StreamItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
