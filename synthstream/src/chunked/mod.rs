// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Chunked transfer producer.
//!
//! Reads a byte stream chunk by chunk, incrementally parses it as a
//! header-then-rows tabular format, and emits exactly once per chunk read:
//! `Streaming` while data may still arrive, `Done` on the terminal read,
//! after which the producer self-terminates. At most one schema is live at
//! a time: a repeated header replaces the buffer with a fresh one before
//! the new columns are installed, discarding accumulated rows.

mod parser;

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use synthstream_core::{
    CircularFrame, FieldType, RequestContext, SharedFrame, StreamEvent, StreamItem, StreamType,
    Value,
};

use self::parser::{ChunkParser, ParsedRecord};
use crate::chunk_source::ChunkSource;
use crate::engine::StreamHandle;

pub struct ChunkedProducer {
    frame: SharedFrame,
    key: String,
    capacity: usize,
    ref_id: String,
    name: String,
    parser: ChunkParser,
}

impl ChunkedProducer {
    /// Build a producer with an empty, schema-less frame. Columns are
    /// installed by the first header parsed from the transfer.
    pub fn new(ctx: &RequestContext) -> Self {
        let name = ctx.display_name(StreamType::Chunked);
        let frame = CircularFrame::new(ctx.max_rows, &ctx.ref_id, &name);
        Self {
            frame: frame.into_shared(),
            key: ctx.stream_key(StreamType::Chunked),
            capacity: ctx.max_rows,
            ref_id: ctx.ref_id.clone(),
            name,
            parser: ChunkParser::default(),
        }
    }

    /// The buffer emissions currently alias. Replaced on schema change.
    pub fn frame(&self) -> SharedFrame {
        self.frame.clone()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Start the producer over an already-open chunk source.
    pub fn spawn(self, source: impl ChunkSource + 'static) -> StreamHandle {
        StreamHandle::spawn(self.key.clone(), move |tx, token| {
            self.run(source, tx, token)
        })
    }

    pub(crate) async fn run(
        mut self,
        mut source: impl ChunkSource,
        tx: UnboundedSender<StreamItem>,
        token: CancellationToken,
    ) {
        loop {
            let chunk = tokio::select! {
                () = token.cancelled() => return,
                chunk = source.next_chunk() => chunk,
            };
            match chunk {
                Ok(Some(bytes)) => {
                    self.ingest_chunk(&bytes);
                    if token.is_cancelled() {
                        return;
                    }
                    if tx
                        .send(Ok(StreamEvent::streaming(self.frame.clone(), &self.key)))
                        .is_err()
                    {
                        debug!(key = %self.key, "subscriber gone, stopping chunked stream");
                        return;
                    }
                }
                Ok(None) => {
                    debug!(key = %self.key, "transfer finished");
                    // The final line of a transfer may lack its newline.
                    let tail = self.parser.finish();
                    self.apply_records(tail);
                    let _ = tx.send(Ok(StreamEvent::done(self.frame.clone(), &self.key)));
                    return;
                }
                Err(error) => {
                    let _ = tx.send(Err(error));
                    return;
                }
            }
        }
    }

    fn ingest_chunk(&mut self, bytes: &Bytes) {
        let text = String::from_utf8_lossy(bytes);
        let records = self.parser.push(&text);
        self.apply_records(records);
    }

    fn apply_records(&mut self, records: Vec<ParsedRecord>) {
        for record in records {
            match record {
                ParsedRecord::Header(columns) => self.install_header(columns),
                ParsedRecord::Row(row) => self.append_row(&row),
            }
        }
    }

    /// Install a parsed header. When columns are already defined the whole
    /// buffer is replaced first, so exactly one schema is ever live.
    fn install_header(&mut self, columns: Vec<(String, FieldType)>) {
        if !self.frame.read().fields().is_empty() {
            debug!(key = %self.key, "schema change, replacing buffer");
            self.frame = CircularFrame::new(self.capacity, &self.ref_id, &self.name).into_shared();
        }
        let mut frame = self.frame.write();
        for (name, field_type) in columns {
            if let Err(error) = frame.add_field(name, field_type) {
                warn!(key = %self.key, %error, "skipping header column");
            }
        }
    }

    /// Append one parsed row through the normal ring-buffer rule. Rows that
    /// do not fit the live schema are logged and skipped, never fatal.
    fn append_row(&mut self, row: &[f64]) {
        let mut frame = self.frame.write();
        if row.len() != frame.fields().len() {
            warn!(
                key = %self.key,
                got = row.len(),
                want = frame.fields().len(),
                "skipping row with wrong arity"
            );
            return;
        }
        let values: Vec<Value> = frame
            .fields()
            .iter()
            .zip(row)
            .map(|(field, value)| match field.field_type {
                #[allow(clippy::cast_possible_truncation)]
                FieldType::Time => Value::Time(*value as i64),
                _ => Value::Number(*value),
            })
            .collect();
        if let Err(error) = frame.add_row(values) {
            warn!(key = %self.key, %error, "dropping parsed row");
        }
    }
}
