//! Response envelopes for the widget's CRUD manager protocol.
//!
//! Both endpoints answer with `success` plus one `{ "rows": [...] }` envelope
//! per collection, keyed by the collection's wire name. Failures keep HTTP 200
//! and carry `success: false` with a `message`.

use std::collections::BTreeMap;

use crudsync_core::collection::Collection;
use crudsync_core::types::{DbId, Record};
use serde::Serialize;
use serde_json::Value;

/// Standard `{ "rows": [...] }` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Rows {
    pub rows: Vec<Record>,
}

/// `project` block of a load response.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectInfo {
    pub calendar: DbId,
}

/// Body of `GET /load`.
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectInfo>,
    #[serde(flatten)]
    pub collections: BTreeMap<&'static str, Rows>,
}

impl LoadResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
            project: None,
            collections: BTreeMap::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            project: None,
            collections: BTreeMap::new(),
        }
    }

    /// Add a collection snapshot. Empty collections are still reported.
    pub fn insert_rows(&mut self, collection: Collection, rows: Vec<Record>) {
        self.collections.insert(collection.key(), Rows { rows });
    }
}

/// Body of `POST /sync`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub request_id: Value,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub collections: BTreeMap<&'static str, Rows>,
}

impl SyncResponse {
    pub fn success(request_id: Value) -> Self {
        Self {
            request_id,
            success: true,
            message: None,
            collections: BTreeMap::new(),
        }
    }

    pub fn failure(request_id: Value, message: impl Into<String>) -> Self {
        Self {
            request_id,
            success: false,
            message: Some(message.into()),
            collections: BTreeMap::new(),
        }
    }

    /// Report rows the client must reconcile. Collections with nothing to
    /// report are left out of the response entirely.
    pub fn insert_rows(&mut self, collection: Collection, rows: Vec<Record>) {
        if !rows.is_empty() {
            self.collections.insert(collection.key(), Rows { rows });
        }
    }
}
