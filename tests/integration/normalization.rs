//! Integration test: chunk normalization through the wrapper.
//!
//! Entries written through the wrapper come back with the same chunk list
//! they were written with, while the backend holds the compact form.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use reef_filer::{
    ChunkTransform, Context, FileIdTransform, FilerError, FilerStore, FilerStoreWrapper,
    FnTransform, IdentityTransform, MemoryStore,
};
use reef_integration_tests::{
    FlakyStore, MEMORY_TOML, TestFiler, chunk_ids, fid, file, names, path,
};
use reef_types::{Entry, FileChunk, FileId};

#[tokio::test]
async fn test_insert_then_list_parent() {
    let filer = TestFiler::new().await;
    filer.put(file("/dir/file.txt", &["c1"])).await;

    let listed = filer.list("/dir", "", true, 10).await;
    assert_eq!(listed, vec!["file.txt"]);

    let found = filer.get("/dir/file.txt").await.unwrap();
    assert_eq!(found.chunks, vec![FileChunk::new("c1", 0, 100)]);
}

#[tokio::test]
async fn test_round_trip_preserves_chunks() {
    let filer = TestFiler::new().await;

    for n in 0..20u32 {
        let ids: Vec<String> = (0..n % 5).map(|i| fid(n * 10 + i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let p = format!("/data/f{n:02}");
        let mut entry = file(&p, &refs);
        for (i, c) in entry.chunks.iter_mut().enumerate() {
            c.mtime = 1_700_000_000_000_000_000 + i as i64;
            c.e_tag = format!("etag-{n}-{i}");
        }
        entry.extended.insert("user.tag".into(), n.to_be_bytes().to_vec());

        filer.put(entry.clone()).await;
        assert_eq!(filer.get(&p).await.unwrap(), entry, "round trip of {p}");
    }
}

#[tokio::test]
async fn test_backend_holds_structured_locations() {
    let filer = TestFiler::new().await;
    let ids = [fid(1), fid(2)];
    filer.put(file("/a", &[&ids[0], &ids[1]])).await;

    let persisted = filer.persisted("/a").await;
    for (chunk, id) in persisted.chunks.iter().zip(&ids) {
        assert!(chunk.file_id.is_empty(), "text id must not be persisted");
        assert_eq!(chunk.fid, Some(id.parse::<FileId>().unwrap()));
    }

    let found = filer.get("/a").await.unwrap();
    assert_eq!(chunk_ids(&found), ids.to_vec());
    assert!(found.chunks.iter().all(|c| c.fid.is_none()));
}

#[tokio::test]
async fn test_non_canonical_ids_are_stored_as_text() {
    let filer = TestFiler::new().await;
    // Leading zero in the key: parses, but does not print back the same.
    let odd = "3,001637037d6";
    filer.put(file("/odd", &[odd, "not-a-fid"])).await;

    let persisted = filer.persisted("/odd").await;
    assert_eq!(chunk_ids(&persisted), vec![odd, "not-a-fid"]);
    assert!(persisted.chunks.iter().all(|c| c.fid.is_none()));

    assert_eq!(chunk_ids(&filer.get("/odd").await.unwrap()), vec![odd, "not-a-fid"]);
}

#[tokio::test]
async fn test_caller_supplied_fid_survives_round_trip() {
    let filer = TestFiler::new().await;
    let located: FileId = fid(5).parse().unwrap();
    let mut entry = file("/located", &["", &fid(6)]);
    entry.chunks[0].fid = Some(located);
    filer.put(entry.clone()).await;

    let persisted = filer.persisted("/located").await;
    assert_eq!(persisted.chunks[0].fid, Some(located));
    assert!(persisted.chunks[1].file_id.is_empty());

    assert_eq!(filer.get("/located").await.unwrap(), entry);
}

#[tokio::test]
async fn test_update_replaces_chunk_list() {
    let filer = TestFiler::new().await;
    filer.put(file("/f", &[&fid(1)])).await;

    let replacement = file("/f", &[&fid(2), &fid(3)]);
    filer
        .store()
        .update_entry(filer.ctx(), replacement.clone())
        .await
        .unwrap();

    assert_eq!(filer.get("/f").await.unwrap(), replacement);
}

#[tokio::test]
async fn test_delete_then_find_is_not_found() {
    let filer = TestFiler::new().await;
    filer.put(file("/gone", &[&fid(9)])).await;
    filer
        .store()
        .delete_entry(filer.ctx(), &path("/gone"))
        .await
        .unwrap();

    let err = filer.get("/gone").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "filer: no entry is found in filer store");
}

#[tokio::test]
async fn test_identity_transform_stores_text_ids() {
    let filer = TestFiler::with_transform(MEMORY_TOML, Arc::new(IdentityTransform)).await;
    let id = fid(4);
    filer.put(file("/plain", &[&id])).await;

    let persisted = filer.persisted("/plain").await;
    assert_eq!(chunk_ids(&persisted), vec![id]);
    assert!(persisted.chunks[0].fid.is_none());
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

struct Counted {
    store: FilerStoreWrapper,
    failing: Arc<AtomicBool>,
    encodes: Arc<AtomicUsize>,
    decodes: Arc<AtomicUsize>,
}

/// A memory backend behind [`FlakyStore`], wrapped with a transform that
/// counts its calls.
fn counted() -> Counted {
    let encodes = Arc::new(AtomicUsize::new(0));
    let decodes = Arc::new(AtomicUsize::new(0));
    let (enc, dec) = (encodes.clone(), decodes.clone());
    let transform = FnTransform::new(
        move |chunks: Vec<FileChunk>| {
            enc.fetch_add(1, Ordering::SeqCst);
            FileIdTransform.encode(chunks)
        },
        move |chunks: Vec<FileChunk>| {
            dec.fetch_add(1, Ordering::SeqCst);
            FileIdTransform.decode(chunks)
        },
    );
    let (flaky, failing) = FlakyStore::new(Box::new(MemoryStore::new()));
    Counted {
        store: FilerStoreWrapper::new(Box::new(flaky), Arc::new(transform)),
        failing,
        encodes,
        decodes,
    }
}

#[tokio::test]
async fn test_backend_failures_pass_through_undecoded() {
    let c = counted();
    let ctx = Context::new();
    c.store.insert_entry(&ctx, file("/d/a", &[&fid(1)])).await.unwrap();
    assert_eq!(c.encodes.load(Ordering::SeqCst), 1);

    c.failing.store(true, Ordering::SeqCst);

    let err = c.store.find_entry(&ctx, &path("/d/a")).await.unwrap_err();
    assert_eq!(err, FlakyStore::error());
    let err = c
        .store
        .list_directory_entries(&ctx, &path("/d"), "", true, 10)
        .await
        .unwrap_err();
    assert_eq!(err, FlakyStore::error());
    assert_eq!(c.decodes.load(Ordering::SeqCst), 0);

    // Writes still encode before the backend refuses them.
    let err = c
        .store
        .insert_entry(&ctx, file("/d/b", &[&fid(2)]))
        .await
        .unwrap_err();
    assert_eq!(err, FlakyStore::error());
    assert_eq!(c.encodes.load(Ordering::SeqCst), 2);

    c.failing.store(false, Ordering::SeqCst);
    let err = c.store.find_entry(&ctx, &path("/d/b")).await.unwrap_err();
    assert_eq!(err, FilerError::NotFound);
    assert_eq!(c.decodes.load(Ordering::SeqCst), 0);

    let listed: Vec<Entry> = c
        .store
        .list_directory_entries(&ctx, &path("/d"), "", true, 10)
        .await
        .unwrap();
    assert_eq!(names(&listed), vec!["a"]);
    assert_eq!(c.decodes.load(Ordering::SeqCst), 1);
}
