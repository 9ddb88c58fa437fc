//! Domain logic for the scheduler sync backend.
//!
//! Everything here is pure: collection schemas, the sync wire payloads,
//! field encoding for storage, and phantom-id bookkeeping. Database and
//! HTTP concerns live in `crudsync_db` and `crudsync_api`.

pub mod changes;
pub mod collection;
pub mod error;
pub mod phantom;
pub mod record;
pub mod types;
