// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Incremental parser for the self-describing tabular transfer format.
//!
//! Input arrives as arbitrary text fragments. Only complete lines are
//! parsed; the trailing partial line is retained until the next fragment.
//! A record whose every field parses as a number is a data row; any other
//! record is a header declaring the column set (a name containing "time"
//! declares a time column, everything else a number column).

use synthstream_core::FieldType;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParsedRecord {
    /// Column declarations: `(name, type)` pairs.
    Header(Vec<(String, FieldType)>),
    /// One data row, field values in column order.
    Row(Vec<f64>),
}

#[derive(Debug, Default)]
pub(crate) struct ChunkParser {
    pending: String,
}

impl ChunkParser {
    /// Feed one decoded fragment, returning the records completed by it.
    pub(crate) fn push(&mut self, text: &str) -> Vec<ParsedRecord> {
        self.pending.push_str(text);
        let Some(newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let complete: String = self.pending.drain(..=newline).collect();
        parse_records(&complete)
    }

    /// Drain whatever remains once the transfer has ended. A source is not
    /// required to terminate its final line with a newline.
    pub(crate) fn finish(&mut self) -> Vec<ParsedRecord> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let tail = std::mem::take(&mut self.pending);
        parse_records(&tail)
    }
}

fn parse_records(text: &str) -> Vec<ParsedRecord> {
    let mut records = Vec::new();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                warn!(%error, "skipping unparsable record");
                continue;
            }
        };
        let fields: Vec<&str> = record.iter().map(str::trim).collect();
        if fields.iter().all(|field| field.is_empty()) {
            continue;
        }
        let row: Option<Vec<f64>> = fields.iter().map(|field| field.parse().ok()).collect();
        records.push(match row {
            Some(row) => ParsedRecord::Row(row),
            None => ParsedRecord::Header(
                fields
                    .iter()
                    .map(|name| {
                        let field_type = if name.to_ascii_lowercase().contains("time") {
                            FieldType::Time
                        } else {
                            FieldType::Number
                        };
                        ((*name).to_owned(), field_type)
                    })
                    .collect(),
            ),
        });
    }
    records
}
