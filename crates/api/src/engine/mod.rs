//! Sync engine for the widget's CRUD manager.
//!
//! Contains the snapshot loader behind `/load`, the per-table change applier,
//! and the dispatcher that drives a `/sync` batch across collections.

pub mod applier;
pub mod dispatcher;
pub mod loader;
