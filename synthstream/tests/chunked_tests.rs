// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::Arc;

use synthstream::{ChunkedProducer, LoadingState, RequestContext, StreamError};
use synthstream_core::Value;
use synthstream_test_utils::{assert_no_event, next_event, recv_timeout, ScriptedChunks};

fn chunked_ctx(max_rows: usize) -> RequestContext {
    RequestContext::new(3, "C").with_max_rows(max_rows)
}

#[tokio::test]
async fn one_emission_per_chunk_then_done() -> anyhow::Result<()> {
    // Arrange
    let producer = ChunkedProducer::new(&chunked_ctx(10));
    let source = ScriptedChunks::new(["time,value\n", "100,1\n200,2\n"]);

    // Act
    let mut handle = producer.spawn(source);

    // Assert: header chunk emits with columns but no rows yet.
    let first = next_event(&mut handle, 1000).await;
    assert_eq!(first.state, LoadingState::Streaming);
    {
        let frame = first.frame.read();
        assert_eq!(frame.field_names(), vec!["time", "value"]);
        assert_eq!(frame.row_count(), 0);
    }

    let second = next_event(&mut handle, 1000).await;
    assert_eq!(second.state, LoadingState::Streaming);
    {
        let frame = second.frame.read();
        assert_eq!(frame.row_count(), 2);
        assert_eq!(
            frame.values_of("time").unwrap(),
            vec![Value::Time(100), Value::Time(200)]
        );
        assert_eq!(
            frame.values_of("value").unwrap(),
            vec![Value::Number(1.0), Value::Number(2.0)]
        );
    }

    // The terminal read yields no data but still emits once, tagged Done.
    let last = next_event(&mut handle, 1000).await;
    assert_eq!(last.state, LoadingState::Done);
    assert!(Arc::ptr_eq(&second.frame, &last.frame));

    handle.until_stopped().await;
    assert_no_event(&mut handle, 100).await;
    Ok(())
}

#[tokio::test]
async fn repeated_header_resets_the_buffer() -> anyhow::Result<()> {
    // Arrange: header a,b with one row, then a new header c.
    let producer = ChunkedProducer::new(&chunked_ctx(10));
    let source = ScriptedChunks::new(["a,b\n1,2\n", "c\n"]);
    let mut handle = producer.spawn(source);

    // Act
    let first = next_event(&mut handle, 1000).await;
    let second = next_event(&mut handle, 1000).await;

    // Assert: prior a,b data is discarded with the old buffer.
    {
        let frame = first.frame.read();
        assert_eq!(frame.field_names(), vec!["a", "b"]);
        assert_eq!(frame.row_count(), 1);
    }
    assert!(!Arc::ptr_eq(&first.frame, &second.frame));
    {
        let frame = second.frame.read();
        assert_eq!(frame.field_names(), vec!["c"]);
        assert_eq!(frame.row_count(), 0);
    }
    Ok(())
}

#[tokio::test]
async fn partial_line_spans_chunks() -> anyhow::Result<()> {
    let producer = ChunkedProducer::new(&chunked_ctx(10));
    let source = ScriptedChunks::new(["a,b\n1,", "2\n"]);
    let mut handle = producer.spawn(source);

    let first = next_event(&mut handle, 1000).await;
    assert_eq!(first.frame.read().row_count(), 0);

    let second = next_event(&mut handle, 1000).await;
    let frame = second.frame.read();
    assert_eq!(frame.row_count(), 1);
    assert_eq!(
        frame.last_row().unwrap(),
        vec![Value::Number(1.0), Value::Number(2.0)]
    );
    Ok(())
}

#[tokio::test]
async fn unterminated_final_row_lands_before_done() -> anyhow::Result<()> {
    // Arrange: the body ends mid-line, with no trailing newline.
    let producer = ChunkedProducer::new(&chunked_ctx(10));
    let source = ScriptedChunks::new(["v\n1\n", "2"]);
    let mut handle = producer.spawn(source);

    // Act: the last chunk completes no line, so its emission carries one row.
    let _ = next_event(&mut handle, 1000).await;
    let second = next_event(&mut handle, 1000).await;
    assert_eq!(second.frame.read().row_count(), 1);

    // Assert: the retained tail is flushed into the terminal emission.
    let last = next_event(&mut handle, 1000).await;
    assert_eq!(last.state, LoadingState::Done);
    let frame = last.frame.read();
    assert_eq!(frame.row_count(), 2);
    assert_eq!(
        frame.values_of("v").unwrap(),
        vec![Value::Number(1.0), Value::Number(2.0)]
    );
    Ok(())
}

#[tokio::test]
async fn parsed_rows_respect_ring_capacity() -> anyhow::Result<()> {
    let producer = ChunkedProducer::new(&chunked_ctx(2));
    let source = ScriptedChunks::new(["v\n1\n2\n3\n"]);
    let mut handle = producer.spawn(source);

    let event = next_event(&mut handle, 1000).await;

    let frame = event.frame.read();
    assert_eq!(frame.row_count(), 2);
    assert_eq!(
        frame.values_of("v").unwrap(),
        vec![Value::Number(2.0), Value::Number(3.0)]
    );
    Ok(())
}

#[tokio::test]
async fn wrong_arity_rows_are_skipped() -> anyhow::Result<()> {
    let producer = ChunkedProducer::new(&chunked_ctx(10));
    let source = ScriptedChunks::new(["a,b\n1,2,3\n4,5\n"]);
    let mut handle = producer.spawn(source);

    let event = next_event(&mut handle, 1000).await;

    let frame = event.frame.read();
    assert_eq!(frame.row_count(), 1);
    assert_eq!(
        frame.last_row().unwrap(),
        vec![Value::Number(4.0), Value::Number(5.0)]
    );
    Ok(())
}

#[tokio::test]
async fn read_failure_is_terminal() -> anyhow::Result<()> {
    // Arrange
    let producer = ChunkedProducer::new(&chunked_ctx(10));
    let source = ScriptedChunks::new(["v\n1\n"]).then_error("connection reset");
    let mut handle = producer.spawn(source);
    let _ = next_event(&mut handle, 1000).await;

    // Act
    let failure = recv_timeout(&mut handle, 1000).await.unwrap();

    // Assert
    assert!(matches!(failure, Err(StreamError::Transfer { .. })));
    handle.until_stopped().await;
    assert_no_event(&mut handle, 100).await;
    Ok(())
}

#[tokio::test]
async fn done_then_double_cancel_is_harmless() -> anyhow::Result<()> {
    // Arrange: an immediately-terminal transfer.
    let producer = ChunkedProducer::new(&chunked_ctx(10));
    let mut handle = producer.spawn(ScriptedChunks::new(Vec::<&str>::new()));

    // Act
    let only = next_event(&mut handle, 1000).await;
    handle.cancel();
    handle.cancel();
    handle.until_stopped().await;

    // Assert
    assert_eq!(only.state, LoadingState::Done);
    assert_no_event(&mut handle, 100).await;
    Ok(())
}
