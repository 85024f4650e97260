// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Random-walk signal producer with min/max bands.
//!
//! The walk starts at a uniform value in `[0, 100)` and steps by
//! `uniform(-0.5, 0.5) * spread` on every tick. Bands widen sequentially
//! from the tick's value: each band subtracts (min) and adds (max) another
//! `uniform(0, 1) * noise_band`, so `min ≤ value ≤ max` holds per band and
//! outer bands enclose inner ones.
//!
//! Construction backfills the buffer to capacity with synthetic history so
//! the visible window is full before the first live emission.

use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use synthstream_core::{
    CircularFrame, FieldType, RequestContext, Result, SharedFrame, StreamConfig, StreamEvent,
    StreamItem, StreamType, Value,
};

use crate::engine::StreamHandle;
use crate::util::{now_millis, sleep_or_cancelled};

/// Delay before the first live emission.
const STARTUP_DELAY: Duration = Duration::from_millis(5);

pub struct SignalProducer {
    frame: SharedFrame,
    key: String,
    value: f64,
    spread: f64,
    noise: f64,
    bands: usize,
    interval: Duration,
}

impl SignalProducer {
    /// Build the frame schema, pick the walk's starting value, and backfill
    /// `capacity` rows ending just before now.
    pub fn new(config: &StreamConfig, ctx: &RequestContext) -> Result<Self> {
        let mut frame = CircularFrame::new(
            ctx.max_rows,
            &ctx.ref_id,
            ctx.display_name(StreamType::Signal),
        );
        frame.add_field("time", FieldType::Time)?;
        frame.add_field("value", FieldType::Number)?;
        for band in 0..config.band_count {
            let suffix = if config.band_count > 1 {
                format!(" {}", band + 1)
            } else {
                String::new()
            };
            frame.add_field(format!("Min{suffix}"), FieldType::Number)?;
            frame.add_field(format!("Max{suffix}"), FieldType::Number)?;
        }

        let mut producer = Self {
            frame: frame.into_shared(),
            key: ctx.stream_key(StreamType::Signal),
            value: rand::rng().random_range(0.0..100.0),
            spread: config.spread,
            noise: config.noise_band,
            bands: config.band_count,
            interval: Duration::from_millis(config.update_interval_ms),
        };
        producer.backfill();
        Ok(producer)
    }

    /// The producer's buffer; the same handle every emission aliases.
    pub fn frame(&self) -> SharedFrame {
        self.frame.clone()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn spawn(self) -> StreamHandle {
        StreamHandle::spawn(self.key.clone(), move |tx, token| self.run(tx, token))
    }

    async fn run(mut self, tx: UnboundedSender<StreamItem>, token: CancellationToken) {
        if sleep_or_cancelled(STARTUP_DELAY, &token).await {
            return;
        }
        loop {
            self.add_next_row(now_millis());
            if token.is_cancelled() {
                return;
            }
            if tx
                .send(Ok(StreamEvent::streaming(self.frame.clone(), &self.key)))
                .is_err()
            {
                debug!(key = %self.key, "subscriber gone, stopping signal stream");
                return;
            }
            if sleep_or_cancelled(self.interval, &token).await {
                return;
            }
        }
    }

    fn backfill(&mut self) {
        let capacity = self.frame.read().capacity();
        let interval = self.interval.as_millis() as i64;
        let mut time = now_millis() - capacity as i64 * interval;
        for _ in 0..capacity {
            self.add_next_row(time);
            time += interval;
        }
    }

    fn add_next_row(&mut self, time: i64) {
        let mut rng = rand::rng();
        self.value += (rng.random_range(0.0..1.0) - 0.5) * self.spread;

        let mut row = Vec::with_capacity(2 + self.bands * 2);
        row.push(Value::Time(time));
        row.push(Value::Number(self.value));

        let mut min = self.value;
        let mut max = self.value;
        for _ in 0..self.bands {
            min -= rng.random_range(0.0..1.0) * self.noise;
            max += rng.random_range(0.0..1.0) * self.noise;
            row.push(Value::Number(min));
            row.push(Value::Number(max));
        }

        // Arity always matches the schema built in `new`.
        if let Err(error) = self.frame.write().add_row(row) {
            warn!(key = %self.key, %error, "dropping signal row");
        }
    }
}
