// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities for the synthstream workspace.

pub mod chunks;
pub mod feed;
pub mod helpers;

pub use self::chunks::ScriptedChunks;
pub use self::feed::{FailingFeedConnector, FeedScript, ScriptedFeedConnector};
pub use self::helpers::{assert_no_event, next_event, recv_timeout};
