//! Phantom-id bookkeeping for one sync batch.
//!
//! The widget identifies unsaved rows by a temporary `$PhantomId`. As each
//! collection's creates complete, the mapping from phantom id to durable id
//! is recorded here, and reference fields of later collections are rewritten
//! before they reach the database.

use std::collections::HashMap;

use serde_json::Value;

use crate::collection::{Collection, CollectionSchema};
use crate::record::parse_id;
use crate::types::{DbId, Record, ID_FIELD, PHANTOM_ID_FIELD};

/// Phantom id → durable id, per collection.
#[derive(Debug, Default, Clone)]
pub struct PhantomMap {
    ids: HashMap<Collection, HashMap<String, DbId>>,
}

impl PhantomMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: Collection, phantom_id: impl Into<String>, id: DbId) {
        self.ids
            .entry(collection)
            .or_default()
            .insert(phantom_id.into(), id);
    }

    pub fn resolve(&self, collection: Collection, phantom_id: &str) -> Option<DbId> {
        self.ids.get(&collection)?.get(phantom_id).copied()
    }

    /// Total number of recorded mappings.
    pub fn len(&self) -> usize {
        self.ids.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record the mappings reported by a collection's create results.
    ///
    /// Rows without a phantom id or without a durable id are skipped.
    pub fn record_created(&mut self, collection: Collection, created: &[Record]) {
        for row in created {
            let phantom = row.get(PHANTOM_ID_FIELD).and_then(phantom_key);
            let id = row.get(ID_FIELD).and_then(parse_id);
            if let (Some(phantom), Some(id)) = (phantom, id) {
                self.insert(collection, phantom, id);
            }
        }
    }

    /// Rewrite reference fields of `record` that hold a known phantom id.
    ///
    /// Returns the number of fields rewritten. Unknown phantom ids are left
    /// untouched and rejected later when the row is encoded.
    pub fn remap_record(&self, schema: &CollectionSchema, record: &mut Record) -> usize {
        let mut rewritten = 0;

        for (field, target) in schema.references() {
            let Some(Value::String(phantom)) = record.get(field.name) else {
                continue;
            };
            if let Some(id) = self.resolve(target, phantom) {
                record.insert(field.name.to_string(), Value::from(id));
                rewritten += 1;
            }
        }

        rewritten
    }
}

/// Normalize a phantom id value to a map key.
pub fn phantom_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
