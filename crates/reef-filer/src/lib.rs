//! Filer store contract and chunk normalization.
//!
//! This crate defines the [`FilerStore`] trait that every metadata backend
//! implements, along with:
//!
//! - [`FilerStoreWrapper`]: the decorator callers talk to. It applies a
//!   [`ChunkTransform`] to chunk lists on every write and read.
//! - [`FilerError`]: the shared error type, including the
//!   [`FilerError::NotFound`] sentinel.
//! - [`StoreRegistry`]: picks the one backend enabled in [`Configuration`].
//! - [`MemoryStore`]: an in-memory backend with transaction support.
//! - [`in_transaction`]: scoped begin/commit/rollback.

mod config;
mod error;
mod memory_store;
mod registry;
mod traits;
mod transform;
mod txn;
mod wrapper;


pub use config::Configuration;
pub use error::FilerError;
pub use memory_store::MemoryStore;
pub use registry::{StoreConstructor, StoreRegistry};
pub use traits::{Context, FilerStore, TxnId};
pub use transform::{ChunkTransform, FileIdTransform, FnTransform, IdentityTransform};
pub use txn::in_transaction;
pub use wrapper::FilerStoreWrapper;
