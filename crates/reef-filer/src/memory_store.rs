//! In-memory filer store backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use reef_types::{Entry, FullPath, decode_entry, encode_entry};
use serde::Deserialize;
use tracing::debug;

use crate::config::Configuration;
use crate::error::FilerError;
use crate::traits::{Context, FilerStore, TxnId};

/// Storage key: `(parent directory, name)`, so a directory's children are
/// one contiguous, name-ordered range.
type Key = (String, String);

/// Pending writes of one open transaction; `None` marks a delete.
type Overlay = BTreeMap<Key, Option<Vec<u8>>>;

/// `[memory]` section of the filer configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MemoryStoreConfig {
    /// Maximum number of entries; unlimited when absent.
    max_entries: Option<i64>,
}

/// In-memory filer store backed by a `RwLock<BTreeMap>`.
///
/// Entries are kept as postcard-encoded records, exactly as a key-value
/// backend would persist them. Useful for tests and for embedding.
///
/// Backend-defined behavior:
/// - inserting over an existing path overwrites it;
/// - updating an absent path inserts it;
/// - deleting an absent path succeeds without effect;
/// - transactions buffer writes in a private overlay that reads inside the
///   transaction see; commit applies the overlay atomically, rollback drops
///   it. Nested begins are rejected. A failed commit still closes the handle.
/// - dropping a call's future has no effect on an open transaction; an
///   abandoned handle stays open until committed or rolled back.
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Key, Vec<u8>>>,
    txns: Mutex<HashMap<TxnId, Overlay>>,
    next_txn: AtomicU64,
    max_entries: Option<usize>,
    initialized: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Name under which this backend is registered and configured.
    pub const NAME: &'static str = "memory";

    /// Create an empty store with no entry limit.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            txns: Mutex::new(HashMap::new()),
            next_txn: AtomicU64::new(1),
            max_entries: None,
            initialized: false,
        }
    }

    /// Create an empty store holding at most `max_entries` entries.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::new()
        }
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of transactions currently open.
    pub fn open_transactions(&self) -> usize {
        self.txns.lock().expect("lock poisoned").len()
    }

    /// Write `value` (or a delete when `None`) either into the transaction
    /// overlay or directly into the committed map.
    fn write(&self, ctx: &Context, key: Key, value: Option<Vec<u8>>) -> Result<(), FilerError> {
        if let Some(txn) = ctx.txn() {
            let mut txns = self.txns.lock().expect("lock poisoned");
            let overlay = txns.get_mut(&txn).ok_or_else(|| closed(txn))?;
            overlay.insert(key, value);
            return Ok(());
        }

        let mut map = self.entries.write().expect("lock poisoned");
        match value {
            Some(bytes) => {
                if !map.contains_key(&key) {
                    self.check_capacity(map.len() + 1)?;
                }
                map.insert(key, bytes);
            }
            None => {
                map.remove(&key);
            }
        }
        Ok(())
    }

    fn read(&self, ctx: &Context, key: &Key) -> Result<Option<Vec<u8>>, FilerError> {
        if let Some(txn) = ctx.txn() {
            let txns = self.txns.lock().expect("lock poisoned");
            let overlay = txns.get(&txn).ok_or_else(|| closed(txn))?;
            if let Some(staged) = overlay.get(key) {
                return Ok(staged.clone());
            }
            // Lock order: txns before entries.
            let map = self.entries.read().expect("lock poisoned");
            return Ok(map.get(key).cloned());
        }
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn check_capacity(&self, needed: usize) -> Result<(), FilerError> {
        match self.max_entries {
            Some(max) if needed > max => Err(FilerError::Backend(format!(
                "memory store full: {needed} entries needed, limit is {max}"
            ))),
            _ => Ok(()),
        }
    }

    fn put(&self, ctx: &Context, entry: &Entry) -> Result<(), FilerError> {
        let bytes = encode_entry(entry)?;
        self.write(ctx, key_of(&entry.full_path), Some(bytes))
    }

    /// Children of `dir` with name >= `start`, in name order, with the
    /// transaction overlay (if any) applied.
    fn children(
        &self,
        ctx: &Context,
        dir: &str,
        start: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, FilerError> {
        let from: Key = (dir.to_string(), start.to_string());

        let Some(txn) = ctx.txn() else {
            let map = self.entries.read().expect("lock poisoned");
            return Ok(map
                .range(from..)
                .take_while(|((d, _), _)| d == dir)
                .map(|((_, name), bytes)| (name.clone(), bytes.clone()))
                .collect());
        };

        let txns = self.txns.lock().expect("lock poisoned");
        let overlay = txns.get(&txn).ok_or_else(|| closed(txn))?;
        let map = self.entries.read().expect("lock poisoned");

        let mut merged: BTreeMap<String, Vec<u8>> = map
            .range(from.clone()..)
            .take_while(|((d, _), _)| d == dir)
            .map(|((_, name), bytes)| (name.clone(), bytes.clone()))
            .collect();
        for ((_, name), staged) in overlay.range(from..).take_while(|((d, _), _)| d == dir) {
            match staged {
                Some(bytes) => merged.insert(name.clone(), bytes.clone()),
                None => merged.remove(name),
            };
        }
        Ok(merged.into_iter().collect())
    }
}

fn key_of(path: &FullPath) -> Key {
    let (dir, name) = path.dir_and_name();
    (dir.to_string(), name.to_string())
}

fn closed(txn: TxnId) -> FilerError {
    FilerError::Backend(format!("{txn} is not open"))
}

fn require_txn(ctx: &Context) -> Result<TxnId, FilerError> {
    ctx.txn()
        .ok_or_else(|| FilerError::Backend("context carries no transaction".to_string()))
}

#[async_trait::async_trait]
impl FilerStore for MemoryStore {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn initialize(&mut self, config: &Configuration) -> Result<(), FilerError> {
        if self.initialized {
            return Err(FilerError::Configuration(
                "memory store already initialized".to_string(),
            ));
        }
        let section: MemoryStoreConfig = config.deserialize()?;
        if let Some(max) = section.max_entries {
            let max = usize::try_from(max)
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| {
                    FilerError::Configuration(format!(
                        "max_entries must be a positive integer, got {max}"
                    ))
                })?;
            self.max_entries = Some(max);
        }
        self.initialized = true;
        debug!(max_entries = ?self.max_entries, "initialized memory filer store");
        Ok(())
    }

    async fn insert_entry(&self, ctx: &Context, entry: Entry) -> Result<(), FilerError> {
        self.put(ctx, &entry)?;
        debug!(path = %entry.full_path, chunks = entry.chunks.len(), txn = ?ctx.txn(), "inserted entry");
        Ok(())
    }

    async fn update_entry(&self, ctx: &Context, entry: Entry) -> Result<(), FilerError> {
        self.put(ctx, &entry)?;
        debug!(path = %entry.full_path, chunks = entry.chunks.len(), txn = ?ctx.txn(), "updated entry");
        Ok(())
    }

    async fn find_entry(&self, ctx: &Context, path: &FullPath) -> Result<Entry, FilerError> {
        match self.read(ctx, &key_of(path))? {
            Some(bytes) => Ok(decode_entry(path.clone(), &bytes)?),
            None => Err(FilerError::NotFound),
        }
    }

    async fn delete_entry(&self, ctx: &Context, path: &FullPath) -> Result<(), FilerError> {
        self.write(ctx, key_of(path), None)?;
        debug!(%path, txn = ?ctx.txn(), "deleted entry");
        Ok(())
    }

    async fn list_directory_entries(
        &self,
        ctx: &Context,
        dir: &FullPath,
        start_file_name: &str,
        include_start_file: bool,
        limit: usize,
    ) -> Result<Vec<Entry>, FilerError> {
        let mut entries = Vec::new();
        for (name, bytes) in self.children(ctx, dir.as_str(), start_file_name)? {
            if entries.len() >= limit {
                break;
            }
            // The root is keyed as ("/", "") and is not its own child.
            if name.is_empty() || (!include_start_file && name == start_file_name) {
                continue;
            }
            entries.push(decode_entry(dir.child(&name)?, &bytes)?);
        }
        Ok(entries)
    }

    async fn begin_transaction(&self, ctx: &Context) -> Result<Context, FilerError> {
        if let Some(outer) = ctx.txn() {
            return Err(FilerError::Backend(format!(
                "nested transactions are not supported (already in {outer})"
            )));
        }
        let txn = TxnId::new(self.next_txn.fetch_add(1, Ordering::Relaxed));
        self.txns
            .lock()
            .expect("lock poisoned")
            .insert(txn, Overlay::new());
        debug!(%txn, "began transaction");
        Ok(ctx.with_txn(txn))
    }

    async fn commit_transaction(&self, ctx: &Context) -> Result<(), FilerError> {
        let txn = require_txn(ctx)?;
        let mut txns = self.txns.lock().expect("lock poisoned");
        let overlay = txns.remove(&txn).ok_or_else(|| closed(txn))?;

        let mut map = self.entries.write().expect("lock poisoned");
        let added = overlay
            .iter()
            .filter(|(key, staged)| staged.is_some() && !map.contains_key(*key))
            .count();
        let removed = overlay
            .iter()
            .filter(|(key, staged)| staged.is_none() && map.contains_key(*key))
            .count();
        self.check_capacity(map.len() + added - removed)?;

        let writes = overlay.len();
        for (key, staged) in overlay {
            match staged {
                Some(bytes) => map.insert(key, bytes),
                None => map.remove(&key),
            };
        }
        debug!(%txn, writes, "committed transaction");
        Ok(())
    }

    async fn rollback_transaction(&self, ctx: &Context) -> Result<(), FilerError> {
        let txn = require_txn(ctx)?;
        let overlay = self
            .txns
            .lock()
            .expect("lock poisoned")
            .remove(&txn)
            .ok_or_else(|| closed(txn))?;
        debug!(%txn, discarded = overlay.len(), "rolled back transaction");
        Ok(())
    }
}
