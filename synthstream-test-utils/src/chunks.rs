// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Scripted chunk source for chunked-transfer tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;

use synthstream::ChunkSource;
use synthstream_core::{Result, StreamError};

/// Replays a fixed sequence of chunks, then reports end of stream — or a
/// terminal transfer error when built with [`ScriptedChunks::then_error`].
pub struct ScriptedChunks {
    chunks: VecDeque<Bytes>,
    final_error: Option<String>,
}

impl ScriptedChunks {
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            final_error: None,
        }
    }

    /// Fail with a transfer error after the scripted chunks are exhausted,
    /// instead of ending cleanly.
    pub fn then_error(mut self, context: impl Into<String>) -> Self {
        self.final_error = Some(context.into());
        self
    }
}

#[async_trait]
impl ChunkSource for ScriptedChunks {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        // Suspend before every read so the subscribing test task can observe
        // each emission before the producer mutates the aliased frame again.
        tokio::task::yield_now().await;
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(Some(chunk));
        }
        match self.final_error.take() {
            Some(context) => Err(StreamError::transfer(context)),
            None => Ok(None),
        }
    }
}
