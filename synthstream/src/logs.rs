// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Synthetic log line producer.
//!
//! Emits one `(line, time)` row per tick, no backfill. The corpus and the
//! selection policy live behind [`LineSource`]; the engine injects
//! [`IpsumLines`] by default.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use synthstream_core::{
    CircularFrame, FieldType, FrameMeta, RequestContext, Result, SharedFrame, StreamConfig,
    StreamEvent, StreamItem, StreamType, Value,
};

use crate::engine::StreamHandle;
use crate::util::{now_millis, sleep_or_cancelled};

const STARTUP_DELAY: Duration = Duration::from_millis(5);

/// Source of synthetic log lines. One line is requested per tick.
pub trait LineSource: Send + Sync {
    fn next_line(&self) -> String;
}

/// Default corpus: a static set of plausible service log lines, picked
/// pseudo-randomly.
#[derive(Debug, Default)]
pub struct IpsumLines;

static LINES: &[&str] = &[
    "GET /api/dashboards/home 200 12ms",
    "POST /api/ds/query 200 45ms cached=false",
    "connection pool saturated, waiting for a free slot",
    "WARN slow query detected, took 2.4s",
    "user 42 logged in from 10.0.3.17",
    "cache miss for key dashboard:7:state",
    "GET /public/build/app.js 304 1ms",
    "scheduler woke 3 pending evaluations",
    "ERROR upstream timeout after 30s, dropping request",
    "rotating log segment, 128MiB written",
];

impl LineSource for IpsumLines {
    fn next_line(&self) -> String {
        let idx = rand::rng().random_range(0..LINES.len());
        LINES[idx].to_owned()
    }
}

pub struct LogsProducer {
    frame: SharedFrame,
    key: String,
    interval: Duration,
    lines: Arc<dyn LineSource>,
}

impl LogsProducer {
    pub fn new(
        config: &StreamConfig,
        ctx: &RequestContext,
        lines: Arc<dyn LineSource>,
    ) -> Result<Self> {
        let mut frame = CircularFrame::new(
            ctx.max_rows,
            &ctx.ref_id,
            ctx.display_name(StreamType::Logs),
        );
        frame.add_field("line", FieldType::String)?;
        frame.add_field("time", FieldType::Time)?;
        frame.meta = Some(FrameMeta::logs());

        Ok(Self {
            frame: frame.into_shared(),
            key: ctx.stream_key(StreamType::Logs),
            interval: Duration::from_millis(config.update_interval_ms),
            lines,
        })
    }

    pub fn frame(&self) -> SharedFrame {
        self.frame.clone()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn spawn(self) -> StreamHandle {
        StreamHandle::spawn(self.key.clone(), move |tx, token| self.run(tx, token))
    }

    async fn run(self, tx: UnboundedSender<StreamItem>, token: CancellationToken) {
        if sleep_or_cancelled(STARTUP_DELAY, &token).await {
            return;
        }
        loop {
            let row = vec![
                Value::String(self.lines.next_line()),
                Value::Time(now_millis()),
            ];
            if let Err(error) = self.frame.write().add_row(row) {
                warn!(key = %self.key, %error, "dropping log row");
            }
            if token.is_cancelled() {
                return;
            }
            if tx
                .send(Ok(StreamEvent::streaming(self.frame.clone(), &self.key)))
                .is_err()
            {
                debug!(key = %self.key, "subscriber gone, stopping log stream");
                return;
            }
            if sleep_or_cancelled(self.interval, &token).await {
                return;
            }
        }
    }
}
