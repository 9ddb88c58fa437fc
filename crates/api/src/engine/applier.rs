//! Applies one collection's `added` / `updated` / `removed` rows.
//!
//! Every submitted row is encoded before any statement runs, so a malformed
//! payload fails the batch without touching the database. Only creates
//! produce output: the submitted row with its durable `id` filled in.

use crudsync_core::changes::ChangeSet;
use crudsync_core::collection::{Collection, CollectionSchema};
use crudsync_core::error::CoreError;
use crudsync_core::record::{encode_record, parse_id, EncodedColumn, EncodedRecord};
use crudsync_core::types::{DbId, Record, ID_FIELD};
use crudsync_db::repositories::RecordRepo;
use futures::future::try_join_all;
use serde_json::Value;
use sqlx::{PgConnection, PgPool};

use crate::error::AppResult;

/// Change applier for a single table.
pub struct ChangeApplier {
    schema: &'static CollectionSchema,
}

struct PreparedCreate {
    /// Submitted row, echoed back to the client with its new id.
    echo: Record,
    columns: Vec<EncodedColumn>,
}

impl PreparedCreate {
    fn into_created(mut self, id: DbId) -> Record {
        self.echo.insert(ID_FIELD.to_string(), Value::from(id));
        self.echo
    }
}

struct PreparedUpdate {
    id: DbId,
    columns: Vec<EncodedColumn>,
}

struct PreparedChanges {
    creates: Vec<PreparedCreate>,
    updates: Vec<PreparedUpdate>,
    removed: Vec<DbId>,
}

impl ChangeApplier {
    pub fn new(collection: Collection) -> Self {
        Self {
            schema: collection.schema(),
        }
    }

    /// Apply the changes sequentially on one connection (typically a
    /// transaction): creates, then updates, then deletes.
    pub async fn apply_in(
        &self,
        conn: &mut PgConnection,
        changes: ChangeSet,
    ) -> AppResult<Vec<Record>> {
        let PreparedChanges {
            creates,
            updates,
            removed,
        } = self.prepare(changes)?;

        let mut created = Vec::with_capacity(creates.len());
        for create in creates {
            let id = RecordRepo::insert(&mut *conn, self.schema, &create.columns).await?;
            created.push(create.into_created(id));
        }

        for update in &updates {
            let matched =
                RecordRepo::update(&mut *conn, self.schema, update.id, &update.columns).await?;
            self.note_unmatched(update.id, matched);
        }

        let deleted = RecordRepo::delete_many(&mut *conn, self.schema, &removed).await?;

        self.log_applied(created.len(), updates.len(), deleted);
        Ok(created)
    }

    /// Apply the changes over the pool without a transaction.
    ///
    /// Creates run concurrently with each other, as do updates, and the
    /// three kinds are issued without waiting on one another.
    pub async fn apply_concurrent(
        &self,
        pool: &PgPool,
        changes: ChangeSet,
    ) -> AppResult<Vec<Record>> {
        let PreparedChanges {
            creates,
            updates,
            removed,
        } = self.prepare(changes)?;
        let schema = self.schema;

        let create_all = try_join_all(creates.into_iter().map(|create| async move {
            let id = RecordRepo::insert(pool, schema, &create.columns).await?;
            Ok::<_, sqlx::Error>(create.into_created(id))
        }));
        let update_all = try_join_all(updates.iter().map(|update| async move {
            let matched = RecordRepo::update(pool, schema, update.id, &update.columns).await?;
            Ok::<_, sqlx::Error>((update.id, matched))
        }));
        let delete_all = RecordRepo::delete_many(pool, schema, &removed);

        let (created, updated, deleted) = tokio::try_join!(create_all, update_all, delete_all)?;

        for (id, matched) in &updated {
            self.note_unmatched(*id, *matched);
        }
        self.log_applied(created.len(), updated.len(), deleted);
        Ok(created)
    }

    /// Encode every submitted row up front.
    fn prepare(&self, changes: ChangeSet) -> AppResult<PreparedChanges> {
        let collection = self.schema.collection;
        let removed = changes.removed_ids();

        let mut creates = Vec::with_capacity(changes.added.len());
        for record in changes.added {
            let encoded = self.encode(&record)?;
            creates.push(PreparedCreate {
                echo: record,
                columns: encoded.columns,
            });
        }

        let mut updates = Vec::with_capacity(changes.updated.len());
        for record in changes.updated {
            let id = record.get(ID_FIELD).and_then(parse_id).ok_or_else(|| {
                CoreError::Validation(format!("{collection}: updated row has no valid id"))
            })?;
            let encoded = self.encode(&record)?;
            if encoded.columns.is_empty() {
                tracing::debug!(%collection, id, "Update carries no stored fields, skipping");
                continue;
            }
            updates.push(PreparedUpdate {
                id,
                columns: encoded.columns,
            });
        }

        Ok(PreparedChanges {
            creates,
            updates,
            removed,
        })
    }

    /// Encode one row. The client only sees the field name on failure, the
    /// offending row is logged here.
    fn encode(&self, record: &Record) -> Result<EncodedRecord, CoreError> {
        let encoded = encode_record(self.schema, record).inspect_err(|e| {
            tracing::warn!(
                collection = %self.schema.collection,
                error = %e,
                row = ?record,
                "Rejected submitted row",
            );
        })?;
        self.note_ignored(&encoded.ignored);
        Ok(encoded)
    }

    fn note_ignored(&self, ignored: &[String]) {
        if !ignored.is_empty() {
            tracing::debug!(
                collection = %self.schema.collection,
                fields = ?ignored,
                "Ignoring fields not stored for this collection",
            );
        }
    }

    fn note_unmatched(&self, id: DbId, matched: bool) {
        if !matched {
            tracing::debug!(
                collection = %self.schema.collection,
                id,
                "Update matched no row",
            );
        }
    }

    fn log_applied(&self, created: usize, updated: usize, deleted: u64) {
        tracing::info!(
            collection = %self.schema.collection,
            created,
            updated,
            deleted,
            "Applied collection changes",
        );
    }
}
