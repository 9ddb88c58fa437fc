//! Generic repository for the scheduler tables.
//!
//! Every statement is built from a [`CollectionSchema`]: table and column
//! names only ever come from the static schema, submitted values are always
//! bound as parameters.

use crudsync_core::collection::CollectionSchema;
use crudsync_core::record::{decode_record, ColumnValue, EncodedColumn};
use crudsync_core::types::{DbId, Record, ID_FIELD};
use serde_json::Value;
use sqlx::{PgExecutor, Postgres, QueryBuilder};

/// Provides load, insert, update and delete for any scheduler collection.
pub struct RecordRepo;

impl RecordRepo {
    /// Load every row of the collection, ordered by id.
    ///
    /// Rows come back as wire records keyed by camelCase field name, with
    /// structured fields already parsed.
    pub async fn list<'e, E: PgExecutor<'e>>(
        executor: E,
        schema: &CollectionSchema,
    ) -> Result<Vec<Record>, sqlx::Error> {
        let query = select_query(schema);
        let values = sqlx::query_scalar::<_, Value>(&query)
            .fetch_all(executor)
            .await?;

        let mut rows = Vec::with_capacity(values.len());
        for value in values {
            let Value::Object(mut record) = value else {
                return Err(sqlx::Error::Decode(
                    format!("{} row is not a JSON object", schema.table).into(),
                ));
            };

            let malformed = decode_record(schema, &mut record);
            if !malformed.is_empty() {
                tracing::warn!(
                    table = schema.table,
                    id = ?record.get(ID_FIELD),
                    fields = ?malformed,
                    "Stored structured field is not valid JSON",
                );
            }
            rows.push(record);
        }

        Ok(rows)
    }

    /// Insert a row, returning its new id.
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        schema: &CollectionSchema,
        columns: &[EncodedColumn],
    ) -> Result<DbId, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} ", schema.table));

        if columns.is_empty() {
            builder.push("DEFAULT VALUES");
        } else {
            builder.push("(");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                builder.push(column.column);
            }
            builder.push(") VALUES (");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                bind_value(&mut builder, &column.value);
            }
            builder.push(")");
        }
        builder.push(" RETURNING id");

        builder
            .build_query_scalar::<DbId>()
            .fetch_one(executor)
            .await
    }

    /// Update the given columns of one row.
    ///
    /// Returns `false` if no row with the given `id` exists or `columns` is
    /// empty.
    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        schema: &CollectionSchema,
        id: DbId,
        columns: &[EncodedColumn],
    ) -> Result<bool, sqlx::Error> {
        if columns.is_empty() {
            return Ok(false);
        }

        let mut builder = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", schema.table));
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(column.column).push(" = ");
            bind_value(&mut builder, &column.value);
        }
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(executor).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete rows by id in one statement. Returns the number removed.
    pub async fn delete_many<'e, E: PgExecutor<'e>>(
        executor: E,
        schema: &CollectionSchema,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let query = format!("DELETE FROM {} WHERE id = ANY($1)", schema.table);
        let result = sqlx::query(&query).bind(ids).execute(executor).await?;
        Ok(result.rows_affected())
    }
}

/// `SELECT` projecting each column under its wire name, one JSON object per row.
fn select_query(schema: &CollectionSchema) -> String {
    let projection = std::iter::once(format!("id AS \"{ID_FIELD}\""))
        .chain(
            schema
                .fields
                .iter()
                .map(|f| format!("{} AS \"{}\"", f.column, f.name)),
        )
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT to_jsonb(r) FROM (SELECT {projection} FROM {}) r ORDER BY r.id",
        schema.table
    )
}

fn bind_value(builder: &mut QueryBuilder<'_, Postgres>, value: &ColumnValue) {
    match value.clone() {
        ColumnValue::Text(v) => builder.push_bind(v),
        ColumnValue::Integer(v) => builder.push_bind(v),
        ColumnValue::Float(v) => builder.push_bind(v),
        ColumnValue::Boolean(v) => builder.push_bind(v),
        ColumnValue::Timestamp(v) => builder.push_bind(v),
    };
}
