// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Channel helpers shared by the workspace's integration tests.

use std::time::Duration;

use synthstream::StreamHandle;
use synthstream_core::{StreamEvent, StreamItem};

/// Receive the next item from the handle, panicking after `timeout_ms`.
pub async fn recv_timeout(handle: &mut StreamHandle, timeout_ms: u64) -> Option<StreamItem> {
    tokio::time::timeout(Duration::from_millis(timeout_ms), handle.recv())
        .await
        .expect("timed out waiting for an emission")
}

/// Receive the next emission, panicking on timeout, channel end, or an
/// error item.
pub async fn next_event(handle: &mut StreamHandle, timeout_ms: u64) -> StreamEvent {
    recv_timeout(handle, timeout_ms)
        .await
        .expect("stream ended unexpectedly")
        .expect("stream emitted an error")
}

/// Assert that nothing is emitted within `timeout_ms`. A closed channel
/// (producer stopped, emissions drained) passes.
pub async fn assert_no_event(handle: &mut StreamHandle, timeout_ms: u64) {
    tokio::select! {
        item = handle.recv() => {
            if let Some(item) = item {
                panic!("unexpected emission: {item:?}");
            }
        }
        () = tokio::time::sleep(Duration::from_millis(timeout_ms)) => {}
    }
}
