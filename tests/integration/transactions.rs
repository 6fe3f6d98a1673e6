//! Integration test: transactions through the wrapper.
//!
//! Writes under a transaction are visible to that transaction only until it
//! commits, and vanish if it rolls back.

use reef_filer::{FilerError, FilerStore, in_transaction};
use reef_integration_tests::{TestFiler, chunk_ids, fid, file, path};

#[tokio::test]
async fn test_commit_makes_writes_visible() {
    let filer = TestFiler::new().await;
    let store = filer.store();

    let tx = store.begin_transaction(filer.ctx()).await.unwrap();
    store.insert_entry(&tx, file("/t/a", &[&fid(1)])).await.unwrap();

    // Visible inside, not outside.
    assert_eq!(chunk_ids(&store.find_entry(&tx, &path("/t/a")).await.unwrap()), vec![fid(1)]);
    assert!(filer.get("/t/a").await.unwrap_err().is_not_found());
    assert!(filer.list("/t", "", true, 10).await.is_empty());

    store.commit_transaction(&tx).await.unwrap();
    assert_eq!(chunk_ids(&filer.get("/t/a").await.unwrap()), vec![fid(1)]);
    assert_eq!(filer.list("/t", "", true, 10).await, vec!["a"]);
}

#[tokio::test]
async fn test_rollback_discards_writes_and_deletes() {
    let filer = TestFiler::new().await;
    filer.put(file("/t/keep", &[&fid(1)])).await;
    let store = filer.store();

    let tx = store.begin_transaction(filer.ctx()).await.unwrap();
    store.insert_entry(&tx, file("/t/new", &[&fid(2)])).await.unwrap();
    store.delete_entry(&tx, &path("/t/keep")).await.unwrap();

    let inside = store
        .list_directory_entries(&tx, &path("/t"), "", true, 10)
        .await
        .unwrap();
    assert_eq!(inside.len(), 1);
    assert_eq!(inside[0].name(), "new");

    store.rollback_transaction(&tx).await.unwrap();
    assert_eq!(filer.list("/t", "", true, 10).await, vec!["keep"]);
}

#[tokio::test]
async fn test_closed_transaction_is_rejected() {
    let filer = TestFiler::new().await;
    let store = filer.store();

    let tx = store.begin_transaction(filer.ctx()).await.unwrap();
    store.commit_transaction(&tx).await.unwrap();

    assert!(matches!(
        store.commit_transaction(&tx).await,
        Err(FilerError::Backend(_))
    ));
    assert!(matches!(
        store.insert_entry(&tx, file("/late", &[])).await,
        Err(FilerError::Backend(_))
    ));
}

#[tokio::test]
async fn test_scoped_transaction_commits_batch() {
    let filer = TestFiler::new().await;
    let store = filer.store();

    let written = in_transaction(store, filer.ctx(), |tx| async move {
        for i in 0..10u32 {
            store
                .insert_entry(&tx, file(&format!("/batch/f{i}"), &[&fid(i)]))
                .await?;
        }
        Ok::<_, FilerError>(10)
    })
    .await
    .unwrap();

    assert_eq!(written, 10);
    assert_eq!(filer.list_all("/batch", 3).await.len(), 10);
}

#[tokio::test]
async fn test_scoped_transaction_rolls_back_on_error() {
    let filer = TestFiler::new().await;
    let store = filer.store();

    let result: Result<(), FilerError> = in_transaction(store, filer.ctx(), |tx| async move {
        store.insert_entry(&tx, file("/batch/ok", &[&fid(1)])).await?;
        store.find_entry(&tx, &path("/batch/missing")).await?;
        Ok(())
    })
    .await;

    assert_eq!(result.unwrap_err(), FilerError::NotFound);
    assert!(filer.list("/batch", "", true, 10).await.is_empty());
}

#[tokio::test]
async fn test_concurrent_transactions_are_isolated() {
    let filer = TestFiler::new().await;
    let store = filer.store();

    let a = store.begin_transaction(filer.ctx()).await.unwrap();
    let b = store.begin_transaction(filer.ctx()).await.unwrap();
    assert_ne!(a.txn(), b.txn());

    store.insert_entry(&a, file("/iso/a", &[])).await.unwrap();
    store.insert_entry(&b, file("/iso/b", &[])).await.unwrap();
    assert!(store.find_entry(&a, &path("/iso/b")).await.unwrap_err().is_not_found());
    assert!(store.find_entry(&b, &path("/iso/a")).await.unwrap_err().is_not_found());

    store.commit_transaction(&a).await.unwrap();
    store.rollback_transaction(&b).await.unwrap();
    assert_eq!(filer.list("/iso", "", true, 10).await, vec!["a"]);
}
