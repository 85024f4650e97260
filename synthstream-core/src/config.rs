// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Stream query normalization and per-request context.
//!
//! A [`StreamQuery`] arrives from the (external) query editor with every
//! field optional; [`StreamQuery::resolve`] merges it over the defaults and
//! validates it into a [`StreamConfig`]. Unknown stream types and invalid
//! tunables are setup-time errors: they fail here, before any producer
//! resource is acquired.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};

/// Generation strategy selected by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    /// Deterministic-random walk with optional min/max bands.
    Signal,
    /// Periodic synthetic log lines.
    Logs,
    /// Bridge from an external publish/subscribe feed.
    #[serde(alias = "mqtt")]
    External,
    /// Incremental chunked-transfer tabular parsing.
    #[serde(alias = "fetch")]
    Chunked,
}

impl StreamType {
    /// Parse a wire name, accepting the legacy aliases `mqtt` and `fetch`.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "signal" => Ok(Self::Signal),
            "logs" => Ok(Self::Logs),
            "external" | "mqtt" => Ok(Self::External),
            "chunked" | "fetch" => Ok(Self::Chunked),
            other => Err(StreamError::UnknownStreamType {
                stream_type: other.to_owned(),
            }),
        }
    }

    /// Canonical name, used as the stream-key variant prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signal => "signal",
            Self::Logs => "logs",
            Self::External => "external",
            Self::Chunked => "chunked",
        }
    }

    /// Capitalized label used in default frame display names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Signal => "Signal",
            Self::Logs => "Logs",
            Self::External => "External",
            Self::Chunked => "Chunked",
        }
    }
}

/// Raw stream query as supplied by the editor. Every field is optional;
/// legacy wire names from the original datasource are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamQuery {
    #[serde(rename = "type")]
    pub stream_type: Option<String>,
    #[serde(alias = "update")]
    pub update_interval_ms: Option<u64>,
    pub spread: Option<f64>,
    #[serde(alias = "noise")]
    pub noise_band: Option<f64>,
    #[serde(alias = "bands")]
    pub band_count: Option<usize>,
    pub url: Option<String>,
    #[serde(alias = "type_field")]
    pub field_selector: Option<String>,
}

/// Fully resolved, validated stream configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    pub stream_type: StreamType,
    pub update_interval_ms: u64,
    pub spread: f64,
    pub noise_band: f64,
    pub band_count: usize,
    pub url: Option<String>,
    pub field_selector: String,
}

impl StreamQuery {
    /// Merge this query over the defaults and validate it.
    pub fn resolve(&self) -> Result<StreamConfig> {
        let stream_type = match self.stream_type.as_deref() {
            Some(raw) => StreamType::parse(raw)?,
            None => StreamType::External,
        };
        let update_interval_ms = self.update_interval_ms.unwrap_or(250);
        if update_interval_ms == 0 {
            return Err(StreamError::invalid_config(
                "updateIntervalMs must be greater than zero",
            ));
        }
        Ok(StreamConfig {
            stream_type,
            update_interval_ms,
            spread: self.spread.unwrap_or(3.5),
            noise_band: self.noise_band.unwrap_or(2.2),
            band_count: self.band_count.unwrap_or(1),
            url: self.url.clone(),
            field_selector: self
                .field_selector
                .clone()
                .unwrap_or_else(|| "speed".to_owned()),
        })
    }
}

/// Per-request context handed to the dispatcher alongside the query.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Row budget for every frame created by this request.
    pub max_rows: usize,
    /// Identifier of the originating request (panel, test run, ...).
    pub request_id: u64,
    /// Correlation id tying emissions back to one query.
    pub ref_id: String,
    /// Optional display-name override.
    pub alias: Option<String>,
    /// Template variables already substituted for this request.
    pub scoped_vars: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(request_id: u64, ref_id: impl Into<String>) -> Self {
        Self {
            max_rows: 1000,
            request_id,
            ref_id: ref_id.into(),
            alias: None,
            scoped_vars: HashMap::new(),
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.scoped_vars.insert(name.into(), value.into());
        self
    }

    /// Resolve a `$name` template expression against the scoped variables.
    ///
    /// Anything that is not a `$` expression, or that names an unknown
    /// variable, falls back to the literal input.
    pub fn resolve_var<'a>(&'a self, expr: &'a str) -> &'a str {
        expr.strip_prefix('$')
            .and_then(|name| self.scoped_vars.get(name))
            .map_or(expr, String::as_str)
    }

    /// Frame display name: the alias when set, `"<Label> <refId>"` otherwise.
    pub fn display_name(&self, stream_type: StreamType) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| format!("{} {}", stream_type.label(), self.ref_id))
    }

    /// Stable key correlating all emissions of one producer instance.
    pub fn stream_key(&self, stream_type: StreamType) -> String {
        format!("{}-{}-{}", stream_type.as_str(), self.request_id, self.ref_id)
    }
}
