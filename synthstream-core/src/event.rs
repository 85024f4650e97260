// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Emission types pushed from a producer to its subscriber.

use crate::error::StreamError;
use crate::frame::SharedFrame;

/// Delivery state attached to every emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    /// More data may arrive.
    Streaming,
    /// Terminal emission; the producer has self-terminated.
    Done,
}

/// One emission: a handle to the producer's live buffer, the stable stream
/// key, and the delivery state.
///
/// The frame is aliased, not copied: consecutive emissions of one producer
/// usually carry the same [`SharedFrame`]. Only a schema change in the
/// chunked producer swaps in a new handle.
#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub frame: SharedFrame,
    pub key: String,
    pub state: LoadingState,
}

impl StreamEvent {
    pub fn streaming(frame: SharedFrame, key: impl Into<String>) -> Self {
        Self {
            frame,
            key: key.into(),
            state: LoadingState::Streaming,
        }
    }

    pub fn done(frame: SharedFrame, key: impl Into<String>) -> Self {
        Self {
            frame,
            key: key.into(),
            state: LoadingState::Done,
        }
    }
}

/// Item type of a producer's emission channel. Terminal transfer failures
/// arrive as the final `Err`; everything else is a [`StreamEvent`].
pub type StreamItem = Result<StreamEvent, StreamError>;
