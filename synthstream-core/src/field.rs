// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Field and value primitives for columnar frames.

use std::collections::VecDeque;

/// The type of a frame column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Epoch-millisecond timestamps.
    Time,
    /// 64-bit floating point values.
    Number,
    /// Freeform text.
    String,
}

/// A single cell value, aligned by row index with the values of every other
/// field in the same frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Epoch milliseconds.
    Time(i64),
    Number(f64),
    String(String),
}

impl Value {
    /// The value as `f64`, for `Number` and `Time` cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            #[allow(clippy::cast_precision_loss)]
            Value::Time(t) => Some(*t as f64),
            Value::String(_) => None,
        }
    }

    /// The value as epoch milliseconds, for `Time` cells.
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// The value as a string slice, for `String` cells.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// A named, typed column.
///
/// Values are held in a deque so that overflow eviction (pop at the front,
/// push at the back) is O(1) per column.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub(crate) values: VecDeque<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            values: VecDeque::new(),
        }
    }

    /// Row-ordered view of the column's values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The most recently appended value, if any.
    pub fn last(&self) -> Option<&Value> {
        self.values.back()
    }
}
