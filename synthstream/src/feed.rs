// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Seam between the telemetry bridge and its external publish/subscribe feed.
//!
//! The bridge never talks to a wire protocol directly; it drives a
//! [`FeedConnection`] obtained from the injected [`FeedConnector`]. The
//! engine ships a TCP implementation ([`crate::TcpFeedConnector`]); tests
//! inject scripted ones.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::collections::HashMap;

use synthstream_core::Result;

/// Structured record carried by a feed message payload.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedMessage {
    /// Tag matched against the field→target mapping table.
    pub target: String,
    #[serde(default)]
    pub time: Option<i64>,
    /// Identifier of the emitting device.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub fields: HashMap<String, f64>,
}

/// One live subscription to an external feed.
#[async_trait]
pub trait FeedConnection: Send + std::fmt::Debug {
    /// Subscribe to a topic. Called once per stream lifetime.
    async fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// Wait for the next raw message payload. `None` once the feed is
    /// closed or broken; the bridge never reconnects.
    async fn next_message(&mut self) -> Option<Bytes>;

    /// Best-effort close. Must not block on in-flight feed traffic.
    async fn close(&mut self);
}

/// Factory opening one [`FeedConnection`] per bridge stream.
#[async_trait]
pub trait FeedConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn FeedConnection>>;
}
