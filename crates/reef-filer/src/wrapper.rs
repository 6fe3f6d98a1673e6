//! A [`FilerStore`] wrapper that normalizes chunk lists.
//!
//! `FilerStoreWrapper` owns exactly one backend and one [`ChunkTransform`].
//! Entries are encoded on their way into the backend and decoded on their
//! way out, so backends only ever see the persisted chunk form and callers
//! only ever see the in-memory form. Every other call is forwarded as is.
//!
//! # Example
//!
//! ```ignore
//! let store = FilerStoreWrapper::new(Box::new(MemoryStore::new()), Arc::new(FileIdTransform));
//! store.insert_entry(&Context::new(), entry).await?;
//! ```

use std::sync::Arc;

use reef_types::{Entry, FullPath};

use crate::config::Configuration;
use crate::error::FilerError;
use crate::traits::{Context, FilerStore};
use crate::transform::{ChunkTransform, IdentityTransform};

/// The single entry point callers use to reach a backend.
pub struct FilerStoreWrapper {
    actual_store: Box<dyn FilerStore>,
    transform: Arc<dyn ChunkTransform>,
}

impl FilerStoreWrapper {
    /// Wrap `store`, normalizing chunk lists with `transform`.
    pub fn new(store: Box<dyn FilerStore>, transform: Arc<dyn ChunkTransform>) -> Self {
        Self {
            actual_store: store,
            transform,
        }
    }

    /// Wrap `store` without changing chunk lists.
    pub fn passthrough(store: Box<dyn FilerStore>) -> Self {
        Self::new(store, Arc::new(IdentityTransform))
    }

    /// The wrapped backend, bypassing normalization.
    pub fn inner(&self) -> &dyn FilerStore {
        self.actual_store.as_ref()
    }

    fn encode(&self, entry: &mut Entry) {
        let chunks = std::mem::take(&mut entry.chunks);
        entry.chunks = self.transform.encode(chunks);
    }

    fn decode(&self, entry: &mut Entry) {
        let chunks = std::mem::take(&mut entry.chunks);
        entry.chunks = self.transform.decode(chunks);
    }
}

#[async_trait::async_trait]
impl FilerStore for FilerStoreWrapper {
    fn name(&self) -> &str {
        self.actual_store.name()
    }

    async fn initialize(&mut self, config: &Configuration) -> Result<(), FilerError> {
        self.actual_store.initialize(config).await
    }

    async fn insert_entry(&self, ctx: &Context, mut entry: Entry) -> Result<(), FilerError> {
        self.encode(&mut entry);
        self.actual_store.insert_entry(ctx, entry).await
    }

    async fn update_entry(&self, ctx: &Context, mut entry: Entry) -> Result<(), FilerError> {
        self.encode(&mut entry);
        self.actual_store.update_entry(ctx, entry).await
    }

    async fn find_entry(&self, ctx: &Context, path: &FullPath) -> Result<Entry, FilerError> {
        // A failed lookup has no entry to decode; the error goes back untouched.
        let mut entry = self.actual_store.find_entry(ctx, path).await?;
        self.decode(&mut entry);
        Ok(entry)
    }

    async fn delete_entry(&self, ctx: &Context, path: &FullPath) -> Result<(), FilerError> {
        self.actual_store.delete_entry(ctx, path).await
    }

    async fn list_directory_entries(
        &self,
        ctx: &Context,
        dir: &FullPath,
        start_file_name: &str,
        include_start_file: bool,
        limit: usize,
    ) -> Result<Vec<Entry>, FilerError> {
        let mut entries = self
            .actual_store
            .list_directory_entries(ctx, dir, start_file_name, include_start_file, limit)
            .await?;
        for entry in &mut entries {
            self.decode(entry);
        }
        Ok(entries)
    }

    async fn begin_transaction(&self, ctx: &Context) -> Result<Context, FilerError> {
        self.actual_store.begin_transaction(ctx).await
    }

    async fn commit_transaction(&self, ctx: &Context) -> Result<(), FilerError> {
        self.actual_store.commit_transaction(ctx).await
    }

    async fn rollback_transaction(&self, ctx: &Context) -> Result<(), FilerError> {
        self.actual_store.rollback_transaction(ctx).await
    }
}
