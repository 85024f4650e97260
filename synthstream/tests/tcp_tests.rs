// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use synthstream::{FeedConnector, StreamError, TcpFeedConnector};

#[tokio::test]
async fn subscribes_and_reads_line_delimited_messages() -> anyhow::Result<()> {
    // Arrange: a one-shot feed server.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        let handshake = lines.next_line().await.unwrap().unwrap();
        assert_eq!(handshake, "SUB big_data/alpha");

        write
            .write_all(b"\n{\"target\":\"vehicle_status\",\"fields\":{\"speed\":1.5}}\n")
            .await
            .unwrap();
    });

    // Act
    let mut connection = TcpFeedConnector.connect(&addr.to_string()).await?;
    connection.subscribe("big_data/alpha").await?;
    let payload = connection.next_message().await.expect("one message");

    // Assert: the blank line was skipped, the JSON line delivered whole.
    assert_eq!(
        payload.as_ref(),
        br#"{"target":"vehicle_status","fields":{"speed":1.5}}"#
    );

    // Server closes after writing; the feed reports end of stream.
    assert!(connection.next_message().await.is_none());
    connection.close().await;
    server.await?;
    Ok(())
}

#[tokio::test]
async fn refused_connection_is_a_connection_error() {
    // Bind-then-drop to get a port with nothing listening.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = TcpFeedConnector
        .connect(&format!("127.0.0.1:{port}"))
        .await
        .unwrap_err();

    assert!(matches!(err, StreamError::Connection { .. }));
}
