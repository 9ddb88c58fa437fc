/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// A row as exchanged with the scheduler widget: a JSON object keyed by
/// camelCase field name.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Field carrying the client-generated temporary id of an unsaved row.
pub const PHANTOM_ID_FIELD: &str = "$PhantomId";

/// Field carrying the durable id of a persisted row.
pub const ID_FIELD: &str = "id";
