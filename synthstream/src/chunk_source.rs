// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Byte-stream seam for the chunked transfer producer.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use synthstream_core::{Result, StreamError};

/// Incremental source of response-body chunks.
///
/// `Ok(None)` is the terminal read; `Err` is a terminal transfer failure.
/// Either way the producer stops reading afterwards.
#[async_trait]
pub trait ChunkSource: Send {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// [`ChunkSource`] over an HTTP response body, consumed as it arrives.
pub struct HttpChunkSource {
    body: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
}

impl HttpChunkSource {
    /// Issue the single GET of the stream's lifetime and hand back the body
    /// as a chunk source. Any failure here is terminal.
    pub async fn open(client: &reqwest::Client, url: &str) -> Result<Self> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| StreamError::transfer(format!("GET {url}: {e}")))?
            .error_for_status()
            .map_err(|e| StreamError::transfer(format!("GET {url}: {e}")))?;
        Ok(Self {
            body: Box::pin(response.bytes_stream()),
        })
    }
}

#[async_trait]
impl ChunkSource for HttpChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        match self.body.next().await {
            Some(Ok(bytes)) => Ok(Some(bytes)),
            Some(Err(error)) => Err(StreamError::transfer(format!("chunk read: {error}"))),
            None => Ok(None),
        }
    }
}
