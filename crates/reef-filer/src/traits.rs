//! The storage contract every filer backend implements.

use std::fmt;

use reef_types::{Entry, FullPath};

use crate::config::Configuration;
use crate::error::FilerError;

/// Opaque transaction handle issued by a backend.
///
/// A handle is open from [`FilerStore::begin_transaction`] until the matching
/// commit or rollback; after that it is closed for good and backends never
/// issue the same value again.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxnId(u64);

impl TxnId {
    /// Wrap a backend-chosen token.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

impl fmt::Debug for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxnId({})", self.0)
    }
}

/// Per-call execution context.
///
/// A plain context runs each call on its own. The context returned by
/// [`FilerStore::begin_transaction`] carries a [`TxnId`]; every call that
/// should join the transaction must be given that derived context, and
/// exactly one of commit or rollback must be called with it on every exit
/// path. See [`in_transaction`](crate::in_transaction) for a scoped helper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    txn: Option<TxnId>,
}

impl Context {
    /// A context outside any transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// The transaction this context belongs to, if any.
    pub fn txn(&self) -> Option<TxnId> {
        self.txn
    }

    /// Derive a context bound to `txn`.
    pub fn with_txn(&self, txn: TxnId) -> Self {
        Self { txn: Some(txn) }
    }
}

/// Trait for persisting filer entries keyed by [`FullPath`].
///
/// Implementations are selected by [`name`](FilerStore::name) at startup
/// through the [`StoreRegistry`](crate::StoreRegistry) and are always used
/// behind a [`FilerStoreWrapper`](crate::FilerStoreWrapper). All
/// implementations must be `Send + Sync` for use across async tasks.
///
/// Where the contract leaves behavior to the backend (insert collisions,
/// update of an absent path, delete of an absent path, nesting, cancellation)
/// each implementation documents its choice.
#[async_trait::async_trait]
pub trait FilerStore: Send + Sync {
    /// Identifier used to locate this backend's section in the configuration.
    fn name(&self) -> &str;

    /// One-time setup. Fails with [`FilerError::Configuration`] if the
    /// backend cannot be made ready or was already initialized.
    async fn initialize(&mut self, config: &Configuration) -> Result<(), FilerError>;

    /// Persist a new entry at `entry.full_path`.
    async fn insert_entry(&self, ctx: &Context, entry: Entry) -> Result<(), FilerError>;

    /// Replace the entry at `entry.full_path` wholesale.
    async fn update_entry(&self, ctx: &Context, entry: Entry) -> Result<(), FilerError>;

    /// Fetch the entry at `path`, or [`FilerError::NotFound`].
    async fn find_entry(&self, ctx: &Context, path: &FullPath) -> Result<Entry, FilerError>;

    /// Remove the entry at `path`.
    async fn delete_entry(&self, ctx: &Context, path: &FullPath) -> Result<(), FilerError>;

    /// List the children of `dir` in lexicographic name order.
    ///
    /// Starts at `start_file_name` (included only if `include_start_file`)
    /// and returns at most `limit` entries. An exhausted range yields an
    /// empty vector, not an error. Callers page by passing the last returned
    /// name back as `start_file_name` with `include_start_file = false`.
    async fn list_directory_entries(
        &self,
        ctx: &Context,
        dir: &FullPath,
        start_file_name: &str,
        include_start_file: bool,
        limit: usize,
    ) -> Result<Vec<Entry>, FilerError>;

    /// Open a transaction and return a context carrying its handle.
    async fn begin_transaction(&self, ctx: &Context) -> Result<Context, FilerError>;

    /// Close the transaction carried by `ctx`, keeping its writes.
    async fn commit_transaction(&self, ctx: &Context) -> Result<(), FilerError>;

    /// Close the transaction carried by `ctx`, discarding its writes.
    async fn rollback_transaction(&self, ctx: &Context) -> Result<(), FilerError>;
}
