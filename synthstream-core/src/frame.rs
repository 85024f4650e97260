// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Fixed-capacity columnar frame with ring-buffer row semantics.
//!
//! [`CircularFrame`] appends rows at the tail and evicts the single oldest
//! row from every column when capacity is exceeded. Columns can never
//! desynchronize: the append and the eviction happen inside one `&mut`
//! method, and producers share the frame with their consumer through a
//! [`SharedFrame`] lock, so no reader can observe a partial mutation.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, StreamError};
use crate::field::{Field, FieldType, Value};

/// A frame handle shared between one producer and its subscriber.
///
/// Emissions alias the live buffer rather than copying it on every tick;
/// the chunked producer swaps in a fresh handle when a schema change
/// forces a new buffer.
pub type SharedFrame = Arc<RwLock<CircularFrame>>;

/// Display metadata carried alongside the columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameMeta {
    /// Hint for consumers that this frame is log-shaped.
    pub preferred_visualisation: Option<String>,
}

impl FrameMeta {
    /// Metadata marking a frame as log-shaped.
    pub fn logs() -> Self {
        Self {
            preferred_visualisation: Some("logs".to_owned()),
        }
    }
}

/// Fixed-capacity, append-at-tail columnar container.
#[derive(Debug, Clone)]
pub struct CircularFrame {
    /// Correlation id tying emissions back to the originating query.
    pub ref_id: String,
    /// Display name of the frame.
    pub name: String,
    pub meta: Option<FrameMeta>,
    capacity: usize,
    fields: Vec<Field>,
}

impl CircularFrame {
    /// Create an empty frame with the given row capacity.
    ///
    /// A zero capacity is clamped to one: a frame that can hold no rows
    /// has no meaningful ring semantics.
    pub fn new(capacity: usize, ref_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            name: name.into(),
            meta: None,
            capacity: capacity.max(1),
            fields: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of rows currently held. All fields share this count.
    pub fn row_count(&self) -> usize {
        self.fields.first().map_or(0, Field::len)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Declare a new column.
    ///
    /// Only legal while the frame holds no rows; declaring a column on a
    /// populated frame would leave it shorter than its peers.
    pub fn add_field(&mut self, name: impl Into<String>, field_type: FieldType) -> Result<()> {
        if self.row_count() > 0 {
            return Err(StreamError::schema(
                "cannot add a field to a frame that already holds rows",
            ));
        }
        self.fields.push(Field::new(name, field_type));
        Ok(())
    }

    /// Append one row, evicting the oldest row from every column if the
    /// frame is at capacity.
    ///
    /// `values` must supply exactly one value per declared field, in
    /// declaration order.
    pub fn add_row(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.fields.len() {
            return Err(StreamError::schema(format!(
                "row arity {} does not match field count {}",
                values.len(),
                self.fields.len()
            )));
        }
        let evict = self.row_count() >= self.capacity;
        for (field, value) in self.fields.iter_mut().zip(values) {
            if evict {
                field.values.pop_front();
            }
            field.values.push_back(value);
        }
        Ok(())
    }

    /// The column with the given name, if declared.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Row-ordered values of the named column.
    pub fn values_of(&self, name: &str) -> Option<Vec<Value>> {
        self.field(name).map(|f| f.values().cloned().collect())
    }

    /// The most recent row, one value per field in declaration order.
    pub fn last_row(&self) -> Option<Vec<Value>> {
        if self.row_count() == 0 {
            return None;
        }
        Some(
            self.fields
                .iter()
                .filter_map(|f| f.last().cloned())
                .collect(),
        )
    }

    /// Wrap this frame into a shareable handle.
    pub fn into_shared(self) -> SharedFrame {
        Arc::new(RwLock::new(self))
    }
}
