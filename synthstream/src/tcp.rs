// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Newline-delimited JSON feed over TCP.
//!
//! Minimal wire client for the bridge's default feed: connect, send one
//! `SUB <topic>` line, then read one JSON payload per line. Blank lines are
//! skipped; a read error counts as end of feed (single connection attempt,
//! no reconnect).

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

use synthstream_core::{Result, StreamError};

use crate::feed::{FeedConnection, FeedConnector};

/// Connects to a `host:port` endpoint speaking the line protocol above.
#[derive(Debug, Default)]
pub struct TcpFeedConnector;

#[async_trait]
impl FeedConnector for TcpFeedConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn FeedConnection>> {
        let stream = TcpStream::connect(endpoint)
            .await
            .map_err(|e| StreamError::connection(format!("connect {endpoint}: {e}")))?;
        let (read, write) = stream.into_split();
        Ok(Box::new(TcpFeedConnection {
            lines: BufReader::new(read).lines(),
            writer: write,
        }))
    }
}

#[derive(Debug)]
struct TcpFeedConnection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

#[async_trait]
impl FeedConnection for TcpFeedConnection {
    async fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.writer
            .write_all(format!("SUB {topic}\n").as_bytes())
            .await
            .map_err(|e| StreamError::connection(format!("subscribe {topic}: {e}")))
    }

    async fn next_message(&mut self) -> Option<Bytes> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(Bytes::from(line)),
                Ok(None) => return None,
                Err(error) => {
                    debug!(%error, "feed read failed, treating as closed");
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.writer.shutdown().await;
    }
}
