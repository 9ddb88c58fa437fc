//! Sync batch dispatcher.
//!
//! Walks the collections of a `/sync` request in [`Collection::SYNC_ORDER`],
//! resolving phantom references against the ids created earlier in the same
//! batch before handing each change set to the [`ChangeApplier`].

use crudsync_core::changes::{ChangeSet, SyncRequest};
use crudsync_core::collection::Collection;
use crudsync_core::phantom::PhantomMap;
use crudsync_core::types::Record;
use serde_json::Value;
use sqlx::PgPool;

use crate::config::SyncMode;
use crate::engine::applier::ChangeApplier;
use crate::error::AppResult;
use crate::response::SyncResponse;

/// Message returned to the widget when a batch fails for a storage reason.
pub const SYNC_FAILED_MESSAGE: &str = "There was an error syncing the data.";

/// Message returned when a JSON body does not have the shape of a sync batch.
pub const MALFORMED_SYNC_MESSAGE: &str = "The sync request is malformed.";

/// Rows created per collection, in processing order.
type CreatedRows = Vec<(Collection, Vec<Record>)>;

/// Applies one sync batch and builds the protocol response.
pub struct SyncDispatcher {
    pool: PgPool,
    mode: SyncMode,
}

impl SyncDispatcher {
    pub fn new(pool: PgPool, mode: SyncMode) -> Self {
        Self { pool, mode }
    }

    /// Parse a raw JSON body and apply it.
    ///
    /// `requestId` is read before the rest of the body so a batch with a bad
    /// shape still gets an envelope the widget can match.
    pub async fn dispatch_body(&self, body: Value) -> SyncResponse {
        let request_id = body.get("requestId").cloned().unwrap_or_default();

        match serde_json::from_value::<SyncRequest>(body) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                tracing::warn!(error = %e, request_id = %request_id, "Malformed sync batch");
                SyncResponse::failure(request_id, MALFORMED_SYNC_MESSAGE)
            }
        }
    }

    /// Apply the batch. Never fails: errors collapse into a
    /// `success: false` envelope carrying the original `requestId`.
    pub async fn dispatch(&self, mut request: SyncRequest) -> SyncResponse {
        let request_id = std::mem::take(&mut request.request_id);

        let result = match self.mode {
            SyncMode::Atomic => self.apply_atomic(request).await,
            SyncMode::Concurrent => self.apply_concurrent(request).await,
        };

        match result {
            Ok(created) => {
                let mut response = SyncResponse::success(request_id);
                for (collection, rows) in created {
                    response.insert_rows(collection, rows);
                }
                response
            }
            Err(e) => {
                tracing::error!(error = %e, request_id = %request_id, "Sync batch failed");
                SyncResponse::failure(request_id, e.client_message(SYNC_FAILED_MESSAGE))
            }
        }
    }

    /// Whole batch in one transaction; dropped (rolled back) on error.
    async fn apply_atomic(&self, mut request: SyncRequest) -> AppResult<CreatedRows> {
        let mut tx = self.pool.begin().await?;
        let mut phantoms = PhantomMap::new();
        let mut created = Vec::new();

        for collection in Collection::SYNC_ORDER {
            let Some(changes) = take_remapped(&mut request, collection, &phantoms) else {
                continue;
            };
            let rows = ChangeApplier::new(collection)
                .apply_in(&mut *tx, changes)
                .await?;
            phantoms.record_created(collection, &rows);
            created.push((collection, rows));
        }

        tx.commit().await?;
        Ok(created)
    }

    /// No transaction. Collections still run in order so phantom ids are
    /// known before dependants are written.
    async fn apply_concurrent(&self, mut request: SyncRequest) -> AppResult<CreatedRows> {
        let mut phantoms = PhantomMap::new();
        let mut created = Vec::new();

        for collection in Collection::SYNC_ORDER {
            let Some(changes) = take_remapped(&mut request, collection, &phantoms) else {
                continue;
            };
            let rows = ChangeApplier::new(collection)
                .apply_concurrent(&self.pool, changes)
                .await?;
            phantoms.record_created(collection, &rows);
            created.push((collection, rows));
        }

        Ok(created)
    }
}

/// Take a collection's change set with phantom references resolved.
fn take_remapped(
    request: &mut SyncRequest,
    collection: Collection,
    phantoms: &PhantomMap,
) -> Option<ChangeSet> {
    let mut changes = request.take_changes(collection)?;
    let remapped = changes.remap_references(collection.schema(), phantoms);
    if remapped > 0 {
        tracing::debug!(%collection, remapped, "Resolved phantom references");
    }
    Some(changes)
}
