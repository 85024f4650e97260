// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Synthetic stream-generation engine.
//!
//! Produces continuously-updating time-series and log frames for testing
//! dashboards and data-consuming clients without a real backend. The
//! [`StreamEngine`] dispatches a [`StreamQuery`] to exactly one producer:
//!
//! - [`SignalProducer`] — deterministic-random walk with min/max bands,
//!   backfilled to capacity before the first live tick,
//! - [`LogsProducer`] — one synthetic log line per tick,
//! - [`BridgeProducer`] — bridges an external publish/subscribe feed into
//!   the periodic-emission model,
//! - [`ChunkedProducer`] — incrementally parses a chunked tabular transfer,
//!   emitting once per chunk until the terminal read.
//!
//! Every producer owns a private [`SharedFrame`] ring buffer and pushes
//! [`StreamEvent`]s over the channel held by its [`StreamHandle`] until it
//! is cancelled or self-terminates.

pub mod bridge;
pub mod chunk_source;
pub mod chunked;
pub mod engine;
pub mod feed;
pub mod logs;
pub mod signal;
pub mod tcp;

mod util;

pub use synthstream_core::{
    CircularFrame, Field, FieldType, FrameMeta, LoadingState, RequestContext, Result, SharedFrame,
    StreamConfig, StreamError, StreamEvent, StreamItem, StreamQuery, StreamType, Value,
};

pub use self::bridge::{BridgeProducer, BridgeSettings};
pub use self::chunk_source::{ChunkSource, HttpChunkSource};
pub use self::chunked::ChunkedProducer;
pub use self::engine::{default_field_mappings, EventStream, StreamEngine, StreamHandle};
pub use self::feed::{FeedConnection, FeedConnector, FeedMessage};
pub use self::logs::{IpsumLines, LineSource, LogsProducer};
pub use self::signal::SignalProducer;
pub use self::tcp::TcpFeedConnector;
