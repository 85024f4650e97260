// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use synthstream::{RequestContext, SignalProducer, StreamQuery};
use synthstream_core::Value;
use synthstream_test_utils::{next_event, recv_timeout};

fn signal_query(update: u64, spread: f64, noise: f64, bands: usize) -> StreamQuery {
    StreamQuery {
        stream_type: Some("signal".to_owned()),
        update_interval_ms: Some(update),
        spread: Some(spread),
        noise_band: Some(noise),
        band_count: Some(bands),
        ..StreamQuery::default()
    }
}

fn wall_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

fn millis(values: &[Value]) -> Vec<i64> {
    values.iter().map(|v| v.as_millis().unwrap()).collect()
}

fn numbers(values: &[Value]) -> Vec<f64> {
    values.iter().map(|v| v.as_f64().unwrap()).collect()
}

#[test]
fn backfill_fills_buffer_to_capacity() -> anyhow::Result<()> {
    // Arrange
    let config = signal_query(100, 3.5, 2.2, 1).resolve()?;
    let ctx = RequestContext::new(1, "A").with_max_rows(5);

    // Act
    let producer = SignalProducer::new(&config, &ctx)?;

    // Assert
    let frame = producer.frame();
    let frame = frame.read();
    assert_eq!(frame.row_count(), 5);

    let times = millis(&frame.values_of("time").unwrap());
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], 100);
    }
    assert!(*times.last().unwrap() <= wall_millis());
    Ok(())
}

#[test]
fn band_columns_enclose_the_value() -> anyhow::Result<()> {
    // Arrange
    let config = signal_query(100, 3.5, 2.2, 3).resolve()?;
    let ctx = RequestContext::new(1, "A").with_max_rows(20);

    // Act
    let producer = SignalProducer::new(&config, &ctx)?;

    // Assert
    let frame = producer.frame();
    let frame = frame.read();
    assert_eq!(
        frame.field_names(),
        vec!["time", "value", "Min 1", "Max 1", "Min 2", "Max 2", "Min 3", "Max 3"]
    );

    let values = numbers(&frame.values_of("value").unwrap());
    for band in 1..=3 {
        let mins = numbers(&frame.values_of(&format!("Min {band}")).unwrap());
        let maxes = numbers(&frame.values_of(&format!("Max {band}")).unwrap());
        for ((value, min), max) in values.iter().zip(&mins).zip(&maxes) {
            assert!(min <= value, "band {band}: min {min} above value {value}");
            assert!(max >= value, "band {band}: max {max} below value {value}");
        }
    }
    Ok(())
}

#[test]
fn single_band_columns_carry_no_suffix() -> anyhow::Result<()> {
    let config = signal_query(100, 3.5, 2.2, 1).resolve()?;
    let ctx = RequestContext::new(1, "A").with_max_rows(5);

    let producer = SignalProducer::new(&config, &ctx)?;

    let frame = producer.frame();
    assert_eq!(frame.read().field_names(), vec!["time", "value", "Min", "Max"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn live_ticks_evict_oldest_rows() -> anyhow::Result<()> {
    // Arrange: capacity 5, interval 100ms, buffer full from backfill.
    let config = signal_query(100, 3.5, 2.2, 1).resolve()?;
    let ctx = RequestContext::new(1, "A").with_max_rows(5);
    let producer = SignalProducer::new(&config, &ctx)?;
    let frame = producer.frame();
    let before = numbers(&frame.read().values_of("value").unwrap());

    // Act: three live ticks.
    let mut handle = producer.spawn();
    for _ in 0..3 {
        let event = next_event(&mut handle, 1000).await;
        assert_eq!(event.frame.read().row_count(), 5);
    }

    // Assert: still exactly 5 rows, and the walk only moved by bounded steps.
    let after = numbers(&frame.read().values_of("value").unwrap());
    assert_eq!(after.len(), 5);
    // The two oldest surviving values are shared with the pre-tick window.
    assert_eq!(&after[..2], &before[3..]);
    for pair in after.windows(2) {
        assert!((pair[1] - pair[0]).abs() <= 3.5 / 2.0 + 1e-9);
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn emissions_alias_the_same_buffer() -> anyhow::Result<()> {
    let config = signal_query(50, 3.5, 2.2, 1).resolve()?;
    let ctx = RequestContext::new(1, "A").with_max_rows(10);
    let mut handle = SignalProducer::new(&config, &ctx)?.spawn();

    let first = next_event(&mut handle, 1000).await;
    let second = next_event(&mut handle, 1000).await;

    assert!(std::sync::Arc::ptr_eq(&first.frame, &second.frame));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_further_ticks() -> anyhow::Result<()> {
    // Arrange
    let config = signal_query(50, 3.5, 2.2, 1).resolve()?;
    let ctx = RequestContext::new(1, "A").with_max_rows(10);
    let mut handle = SignalProducer::new(&config, &ctx)?.spawn();
    let _ = next_event(&mut handle, 1000).await;

    // Act
    handle.cancel();
    handle.cancel();
    handle.until_stopped().await;

    // Assert: the channel drains to a close, no new ticks arrive.
    while let Some(item) = recv_timeout(&mut handle, 1000).await {
        item.expect("only data events expected");
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn buffered_emissions_drain_after_cancel() -> anyhow::Result<()> {
    // Arrange: let several ticks queue up without receiving any.
    let config = signal_query(50, 3.5, 2.2, 1).resolve()?;
    let ctx = RequestContext::new(1, "A").with_max_rows(10);
    let mut handle = SignalProducer::new(&config, &ctx)?.spawn();
    tokio::time::sleep(Duration::from_millis(160)).await;

    // Act
    handle.cancel();
    handle.until_stopped().await;

    // Assert: already-queued emissions stay receivable, then the channel
    // closes; nothing produced after the stop.
    let mut drained = 0;
    while let Some(item) = recv_timeout(&mut handle, 1000).await {
        item.expect("only data events expected");
        drained += 1;
    }
    assert!(drained >= 1, "pre-cancel emissions were dropped");
    Ok(())
}
