//! Scoped transactions over any [`FilerStore`].

use std::future::Future;

use tracing::warn;

use crate::error::FilerError;
use crate::traits::{Context, FilerStore};

/// Run `f` inside a transaction on `store`.
///
/// Begins a transaction from `ctx`, hands the derived context to `f`, then
/// commits if `f` returns `Ok` and rolls back if it returns `Err`. When the
/// rollback itself fails the closure's error is returned and the rollback
/// failure is logged.
///
/// Cancelling the returned future (dropping it) skips both terminal calls;
/// what happens to the open transaction then is up to the backend.
pub async fn in_transaction<S, F, Fut, T>(store: &S, ctx: &Context, f: F) -> Result<T, FilerError>
where
    S: FilerStore + ?Sized,
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = Result<T, FilerError>>,
{
    let txn_ctx = store.begin_transaction(ctx).await?;
    match f(txn_ctx.clone()).await {
        Ok(value) => {
            store.commit_transaction(&txn_ctx).await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = store.rollback_transaction(&txn_ctx).await {
                warn!(txn = ?txn_ctx.txn(), error = %rollback_err, "rollback failed");
            }
            Err(e)
        }
    }
}
