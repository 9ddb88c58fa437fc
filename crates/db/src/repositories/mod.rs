//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! an executor (`&PgPool` or a transaction connection) as the first argument.

pub mod record_repo;

pub use record_repo::RecordRepo;
