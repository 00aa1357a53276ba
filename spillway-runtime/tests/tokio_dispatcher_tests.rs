// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use spillway_core::{Dispatcher, DispatcherExt, DispatcherFactory, SpillwayError};
use spillway_runtime::TokioDispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;
use tokio::time::timeout;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tasks_run_in_submission_order() -> anyhow::Result<()> {
    // Arrange
    let dispatcher = TokioDispatcher::new("ordered")?;
    let (tx, mut rx) = unbounded_channel();

    // Act
    for i in 0..100 {
        let tx = tx.clone();
        dispatcher.submit(i, move |i| {
            let _ = tx.send(i);
        })?;
    }

    // Assert
    let mut received = Vec::new();
    for _ in 0..100 {
        let value = timeout(Duration::from_secs(1), rx.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("channel closed"))?;
        received.push(value);
    }
    assert_eq!(received, (0..100).collect::<Vec<_>>());
    Ok(())
}

#[tokio::test]
async fn test_reentrant_dispatch_runs_after_current_task() -> anyhow::Result<()> {
    // Arrange
    let dispatcher = Arc::new(TokioDispatcher::new("reentrant")?);
    let (tx, mut rx) = unbounded_channel();

    // Act
    let inner = dispatcher.clone();
    let outer_tx = tx.clone();
    dispatcher.dispatch(Box::new(move || {
        let inner_tx = outer_tx.clone();
        inner
            .dispatch(Box::new(move || {
                let _ = inner_tx.send("inner");
            }))
            .expect("dispatcher is open");
        let _ = outer_tx.send("outer");
    }))?;

    // Assert
    let first = timeout(Duration::from_secs(1), rx.recv()).await?;
    let second = timeout(Duration::from_secs(1), rx.recv()).await?;
    assert_eq!(first, Some("outer"));
    assert_eq!(second, Some("inner"));
    Ok(())
}

#[tokio::test]
async fn test_dispatch_after_shutdown_is_rejected() -> anyhow::Result<()> {
    // Arrange
    let dispatcher = TokioDispatcher::new("closed")?;
    dispatcher.shutdown();

    // Act
    let result = dispatcher.dispatch(Box::new(|| {}));

    // Assert
    assert!(matches!(result, Err(SpillwayError::DispatchRejected { .. })));
    Ok(())
}

#[test]
fn test_creation_outside_runtime_is_invalid_configuration() {
    // Act
    let result = TokioDispatcher::new("orphan");

    // Assert
    assert!(matches!(
        result,
        Err(SpillwayError::InvalidConfiguration { .. })
    ));
    assert!(TokioDispatcher::factory().is_err());
}

#[tokio::test]
async fn test_factory_names_dispatchers_sequentially() -> anyhow::Result<()> {
    // Arrange
    let factory = TokioDispatcher::factory()?;

    // Act
    let dispatchers: Vec<_> = (0..3).map(|_| factory.create()).collect();

    // Assert
    let names: Vec<_> = dispatchers.iter().map(|d| d.name().to_string()).collect();
    assert_eq!(names, vec!["tokio-1", "tokio-2", "tokio-3"]);
    Ok(())
}
