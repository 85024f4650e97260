// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Core types for the synthstream synthetic data engine.
//!
//! This crate holds the leaf types shared by every producer: the bounded
//! columnar [`CircularFrame`], the resolved [`StreamConfig`] and per-request
//! [`RequestContext`], the [`StreamEvent`] emission shape, and the root
//! [`StreamError`] taxonomy. The producers themselves live in the
//! `synthstream` crate.

pub mod config;
pub mod error;
pub mod event;
pub mod field;
pub mod frame;

pub use self::config::{RequestContext, StreamConfig, StreamQuery, StreamType};
pub use self::error::{Result, StreamError};
pub use self::event::{LoadingState, StreamEvent, StreamItem};
pub use self::field::{Field, FieldType, Value};
pub use self::frame::{CircularFrame, FrameMeta, SharedFrame};
