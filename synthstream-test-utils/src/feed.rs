// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Scripted in-process feed for bridge tests.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use synthstream::{FeedConnection, FeedConnector};
use synthstream_core::{Result, StreamError};

/// Test-side handle to a [`ScriptedFeedConnector`]: push payloads into the
/// connected bridge and observe what it subscribed to.
#[derive(Clone)]
pub struct FeedScript {
    tx: UnboundedSender<Bytes>,
    topics: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

impl FeedScript {
    /// Push one raw message payload to the subscriber.
    pub fn publish(&self, payload: impl Into<Bytes>) {
        self.tx
            .send(payload.into())
            .expect("scripted feed has no live connection");
    }

    /// Topics subscribed so far.
    pub fn subscribed_topics(&self) -> Vec<String> {
        self.topics.lock().clone()
    }

    /// Whether the connection was closed by the bridge.
    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}

/// A [`FeedConnector`] serving exactly one scripted connection.
pub struct ScriptedFeedConnector {
    rx: Mutex<Option<UnboundedReceiver<Bytes>>>,
    topics: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

impl ScriptedFeedConnector {
    pub fn new() -> (Self, FeedScript) {
        let (tx, rx) = mpsc::unbounded_channel();
        let topics = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(false));
        (
            Self {
                rx: Mutex::new(Some(rx)),
                topics: topics.clone(),
                closed: closed.clone(),
            },
            FeedScript { tx, topics, closed },
        )
    }
}

#[async_trait]
impl FeedConnector for ScriptedFeedConnector {
    async fn connect(&self, _endpoint: &str) -> Result<Box<dyn FeedConnection>> {
        let rx = self
            .rx
            .lock()
            .take()
            .ok_or_else(|| StreamError::connection("scripted feed already connected"))?;
        Ok(Box::new(ScriptedConnection {
            rx,
            topics: self.topics.clone(),
            closed: self.closed.clone(),
        }))
    }
}

#[derive(Debug)]
struct ScriptedConnection {
    rx: UnboundedReceiver<Bytes>,
    topics: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

#[async_trait]
impl FeedConnection for ScriptedConnection {
    async fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.topics.lock().push(topic.to_owned());
        Ok(())
    }

    async fn next_message(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        *self.closed.lock() = true;
    }
}

/// A connector whose handshake always fails, for silent-degrade tests.
#[derive(Debug, Default)]
pub struct FailingFeedConnector;

#[async_trait]
impl FeedConnector for FailingFeedConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn FeedConnection>> {
        Err(StreamError::connection(format!(
            "refused handshake with {endpoint}"
        )))
    }
}
