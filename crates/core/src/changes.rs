//! Sync request payloads sent by the widget's CRUD manager.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::collection::{Collection, CollectionSchema};
use crate::phantom::PhantomMap;
use crate::record::parse_id;
use crate::types::{DbId, Record};

/// A removed row, identified by its durable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RemovedRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: DbId,
}

/// Same rule as updated rows: an integer or an integer string.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DbId, D::Error> {
    let value = Value::deserialize(deserializer)?;
    parse_id(&value).ok_or_else(|| serde::de::Error::custom("expected an integer id"))
}

/// Added, updated and removed rows for one collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub added: Vec<Record>,
    #[serde(default)]
    pub updated: Vec<Record>,
    #[serde(default)]
    pub removed: Vec<RemovedRecord>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Ids of the removed rows.
    pub fn removed_ids(&self) -> Vec<DbId> {
        self.removed.iter().map(|r| r.id).collect()
    }

    /// Resolve phantom references in added and updated rows.
    ///
    /// Returns the number of fields rewritten.
    pub fn remap_references(&mut self, schema: &CollectionSchema, phantoms: &PhantomMap) -> usize {
        if phantoms.is_empty() {
            return 0;
        }
        self.added
            .iter_mut()
            .chain(self.updated.iter_mut())
            .map(|record| phantoms.remap_record(schema, record))
            .sum()
    }
}

/// Body of `POST /sync`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Echoed back verbatim. The widget sends a number or a string.
    #[serde(default)]
    pub request_id: Value,
    pub calendars: Option<ChangeSet>,
    pub resources: Option<ChangeSet>,
    pub events: Option<ChangeSet>,
    pub assignments: Option<ChangeSet>,
    pub dependencies: Option<ChangeSet>,
}

impl SyncRequest {
    pub fn changes(&self, collection: Collection) -> Option<&ChangeSet> {
        self.slot(collection).as_ref()
    }

    /// Move a collection's change set out of the request.
    pub fn take_changes(&mut self, collection: Collection) -> Option<ChangeSet> {
        self.slot_mut(collection).take()
    }

    fn slot(&self, collection: Collection) -> &Option<ChangeSet> {
        match collection {
            Collection::Calendars => &self.calendars,
            Collection::Resources => &self.resources,
            Collection::Events => &self.events,
            Collection::Assignments => &self.assignments,
            Collection::Dependencies => &self.dependencies,
        }
    }

    fn slot_mut(&mut self, collection: Collection) -> &mut Option<ChangeSet> {
        match collection {
            Collection::Calendars => &mut self.calendars,
            Collection::Resources => &mut self.resources,
            Collection::Events => &mut self.events,
            Collection::Assignments => &mut self.assignments,
            Collection::Dependencies => &mut self.dependencies,
        }
    }
}
