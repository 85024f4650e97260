// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use synthstream_core::{RequestContext, StreamError, StreamQuery, StreamType};

#[test]
fn defaults_match_the_external_bridge_profile() -> anyhow::Result<()> {
    let config = StreamQuery::default().resolve()?;

    assert_eq!(config.stream_type, StreamType::External);
    assert_eq!(config.update_interval_ms, 250);
    assert_eq!(config.spread, 3.5);
    assert_eq!(config.noise_band, 2.2);
    assert_eq!(config.band_count, 1);
    assert_eq!(config.field_selector, "speed");
    assert_eq!(config.url, None);
    Ok(())
}

#[test]
fn supplied_fields_merge_over_defaults() -> anyhow::Result<()> {
    let query = StreamQuery {
        stream_type: Some("signal".to_owned()),
        update_interval_ms: Some(100),
        band_count: Some(0),
        ..StreamQuery::default()
    };

    let config = query.resolve()?;

    assert_eq!(config.stream_type, StreamType::Signal);
    assert_eq!(config.update_interval_ms, 100);
    assert_eq!(config.band_count, 0);
    assert_eq!(config.spread, 3.5);
    Ok(())
}

#[test]
fn legacy_wire_names_deserialize() -> anyhow::Result<()> {
    // The original datasource sent `update`, `noise`, `bands`, `type_field`.
    let query: StreamQuery = serde_json::from_value(serde_json::json!({
        "type": "mqtt",
        "update": 100,
        "noise": 1.0,
        "bands": 2,
        "type_field": "rpm",
    }))?;

    let config = query.resolve()?;
    assert_eq!(config.stream_type, StreamType::External);
    assert_eq!(config.update_interval_ms, 100);
    assert_eq!(config.noise_band, 1.0);
    assert_eq!(config.band_count, 2);
    assert_eq!(config.field_selector, "rpm");
    Ok(())
}

#[test]
fn fetch_alias_maps_to_chunked() -> anyhow::Result<()> {
    let query = StreamQuery {
        stream_type: Some("fetch".to_owned()),
        url: Some("http://localhost/data.csv".to_owned()),
        ..StreamQuery::default()
    };

    assert_eq!(query.resolve()?.stream_type, StreamType::Chunked);
    Ok(())
}

#[test]
fn unknown_type_is_a_setup_error() {
    let query = StreamQuery {
        stream_type: Some("websocket".to_owned()),
        ..StreamQuery::default()
    };

    let err = query.resolve().unwrap_err();
    assert!(matches!(
        err,
        StreamError::UnknownStreamType { ref stream_type } if stream_type == "websocket"
    ));
    assert!(err.is_setup());
}

#[test]
fn zero_interval_is_rejected() {
    let query = StreamQuery {
        update_interval_ms: Some(0),
        ..StreamQuery::default()
    };

    assert!(matches!(
        query.resolve().unwrap_err(),
        StreamError::InvalidConfig { .. }
    ));
}

#[test]
fn scoped_vars_resolve_dollar_expressions() {
    let ctx = RequestContext::new(1, "A").with_var("device", "alpha");

    assert_eq!(ctx.resolve_var("$device"), "alpha");
    assert_eq!(ctx.resolve_var("$unknown"), "$unknown");
    assert_eq!(ctx.resolve_var("plain"), "plain");
}

#[test]
fn stream_key_and_display_name() {
    let ctx = RequestContext::new(9, "B2");

    assert_eq!(ctx.stream_key(StreamType::Logs), "logs-9-B2");
    assert_eq!(ctx.display_name(StreamType::Logs), "Logs B2");
    assert_eq!(
        ctx.clone().with_alias("Renamed").display_name(StreamType::Logs),
        "Renamed"
    );
}
