//! Conversion between wire records and typed column values.
//!
//! Writes go through [`encode_record`], which keeps only the fields declared
//! in the collection schema and coerces each JSON value into a
//! [`ColumnValue`]. Loaded rows go through [`decode_record`], which parses
//! structured JSON text back into values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::collection::{CollectionSchema, Field, FieldKind};
use crate::error::CoreError;
use crate::types::{DbId, Record, ID_FIELD, PHANTOM_ID_FIELD};

/// A typed value ready to be bound to an SQL parameter. `None` binds NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Float(Option<f64>),
    Boolean(Option<bool>),
    Timestamp(Option<NaiveDateTime>),
}

/// A column assignment produced from one submitted field.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedColumn {
    pub column: &'static str,
    pub value: ColumnValue,
}

/// The writable part of a submitted record.
#[derive(Debug, Default)]
pub struct EncodedRecord {
    /// Column assignments in schema order.
    pub columns: Vec<EncodedColumn>,
    /// Submitted keys that are not part of the schema and were dropped.
    pub ignored: Vec<String>,
}

/// Encode the schema fields present in `record`.
///
/// `id` and `$PhantomId` are never written. Fields absent from the record are
/// left out, so the result also serves partial updates.
pub fn encode_record(
    schema: &CollectionSchema,
    record: &Record,
) -> Result<EncodedRecord, CoreError> {
    let mut encoded = EncodedRecord::default();

    for field in schema.fields {
        if let Some(value) = record.get(field.name) {
            encoded.columns.push(EncodedColumn {
                column: field.column,
                value: encode_value(schema, field, value)?,
            });
        }
    }

    encoded.ignored = record
        .keys()
        .filter(|key| {
            key.as_str() != ID_FIELD
                && key.as_str() != PHANTOM_ID_FIELD
                && schema.field(key).is_none()
        })
        .cloned()
        .collect();

    Ok(encoded)
}

/// Coerce one JSON value according to the field's kind.
///
/// Error messages name the collection, the field and the expected type but
/// never repeat the submitted value.
pub fn encode_value(
    schema: &CollectionSchema,
    field: &Field,
    value: &Value,
) -> Result<ColumnValue, CoreError> {
    let invalid = |expected: &str| {
        CoreError::Validation(format!(
            "{}.{}: expected {expected}",
            schema.collection, field.name
        ))
    };

    match field.kind {
        FieldKind::Text => match value {
            Value::Null => Ok(ColumnValue::Text(None)),
            Value::String(s) => Ok(ColumnValue::Text(Some(s.clone()))),
            Value::Number(n) => Ok(ColumnValue::Text(Some(n.to_string()))),
            Value::Bool(false) if field.false_is_null => Ok(ColumnValue::Text(None)),
            _ => Err(invalid("a string")),
        },
        FieldKind::Integer => parse_integer(value)
            .map(ColumnValue::Integer)
            .ok_or_else(|| invalid("an integer")),
        FieldKind::Reference(target) => match value {
            Value::String(s) if s.trim().parse::<DbId>().is_err() => {
                Err(CoreError::Validation(format!(
                    "{}.{}: unresolved reference to {target}",
                    schema.collection, field.name
                )))
            }
            _ => parse_integer(value)
                .map(ColumnValue::Integer)
                .ok_or_else(|| invalid("an integer id")),
        },
        FieldKind::Float => match value {
            Value::Null => Ok(ColumnValue::Float(None)),
            Value::Number(n) => n
                .as_f64()
                .map(|f| ColumnValue::Float(Some(f)))
                .ok_or_else(|| invalid("a number")),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|f| ColumnValue::Float(Some(f)))
                .map_err(|_| invalid("a number")),
            _ => Err(invalid("a number")),
        },
        FieldKind::Boolean => match value {
            Value::Null => Ok(ColumnValue::Boolean(None)),
            Value::Bool(b) => Ok(ColumnValue::Boolean(Some(*b))),
            _ => Err(invalid("a boolean")),
        },
        FieldKind::Timestamp => match value {
            Value::Null => Ok(ColumnValue::Timestamp(None)),
            Value::String(s) => parse_timestamp(s)
                .map(|ts| ColumnValue::Timestamp(Some(ts)))
                .ok_or_else(|| invalid("an ISO 8601 date")),
            _ => Err(invalid("an ISO 8601 date")),
        },
        FieldKind::Structured => match value {
            Value::Null => Ok(ColumnValue::Text(None)),
            other => serde_json::to_string(other)
                .map(|json| ColumnValue::Text(Some(json)))
                .map_err(|_| invalid("serializable JSON")),
        },
    }
}

/// Decode a loaded row in place.
///
/// Structured text is parsed back into JSON and NULL columns flagged
/// `omit_when_null` are removed. Returns the names of structured fields whose
/// stored text was not valid JSON; those keep the raw string.
pub fn decode_record(schema: &CollectionSchema, record: &mut Record) -> Vec<&'static str> {
    let mut malformed = Vec::new();

    for field in schema.fields {
        if field.omit_when_null && record.get(field.name).is_some_and(Value::is_null) {
            record.remove(field.name);
            continue;
        }

        if field.kind != FieldKind::Structured {
            continue;
        }

        let Some(Value::String(text)) = record.get(field.name) else {
            continue;
        };
        match serde_json::from_str::<Value>(text) {
            Ok(parsed) => {
                record.insert(field.name.to_string(), parsed);
            }
            Err(_) => malformed.push(field.name),
        }
    }

    malformed
}

/// Read a durable id from a JSON value (integer or integer string).
pub fn parse_id(value: &Value) -> Option<DbId> {
    parse_integer(value).flatten()
}

/// `None` when the value is not integer-like, `Some(None)` for JSON null.
fn parse_integer(value: &Value) -> Option<Option<i64>> {
    match value {
        Value::Null => Some(None),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Some),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Some),
        _ => None,
    }
}

/// Accepted date-time layouts without an offset.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse the date formats the scheduler widget emits.
///
/// Values with an offset keep their wall-clock time in that offset; plain
/// dates become midnight.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::collection::Collection;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn column<'a>(encoded: &'a EncodedRecord, name: &str) -> &'a ColumnValue {
        &encoded
            .columns
            .iter()
            .find(|c| c.column == name)
            .unwrap_or_else(|| panic!("column {name} missing"))
            .value
    }

    #[test]
    fn event_fields_map_to_columns() {
        let schema = Collection::Events.schema();
        let input = record(json!({
            "$PhantomId": "p1",
            "name": "Checkup",
            "startDate": "2024-01-29T08:00",
            "endDate": "2024-01-29T09:00",
            "duration": 1,
            "allDay": false,
        }));

        let encoded = encode_record(schema, &input).unwrap();

        assert_eq!(
            column(&encoded, "name"),
            &ColumnValue::Text(Some("Checkup".into()))
        );
        assert_eq!(
            column(&encoded, "start_date"),
            &ColumnValue::Timestamp(parse_timestamp("2024-01-29T08:00:00"))
        );
        assert_eq!(column(&encoded, "duration"), &ColumnValue::Float(Some(1.0)));
        assert_eq!(column(&encoded, "all_day"), &ColumnValue::Boolean(Some(false)));
        assert!(encoded.ignored.is_empty());
    }

    #[test]
    fn columns_follow_schema_order() {
        let schema = Collection::Events.schema();
        let input = record(json!({ "endDate": null, "name": "A", "startDate": null }));

        let encoded = encode_record(schema, &input).unwrap();
        let columns: Vec<_> = encoded.columns.iter().map(|c| c.column).collect();

        assert_eq!(columns, ["name", "start_date", "end_date"]);
    }

    #[test]
    fn id_and_phantom_id_are_not_written() {
        let schema = Collection::Resources.schema();
        let input = record(json!({ "id": 4, "$PhantomId": "x", "name": "Dr. Smith" }));

        let encoded = encode_record(schema, &input).unwrap();

        assert_eq!(encoded.columns.len(), 1);
        assert!(encoded.ignored.is_empty());
    }

    #[test]
    fn unknown_fields_are_reported_not_written() {
        let schema = Collection::Resources.schema();
        let input = record(json!({ "name": "Room 1", "expanded": true }));

        let encoded = encode_record(schema, &input).unwrap();

        assert_eq!(encoded.columns.len(), 1);
        assert_eq!(encoded.ignored, ["expanded"]);
    }

    #[test]
    fn structured_fields_become_json_text() {
        let schema = Collection::Events.schema();
        let input = record(json!({
            "exceptionDates": ["2024-01-30", "2024-02-06"],
            "segments": [{ "startDate": "2024-01-29T08:00", "duration": 1 }],
        }));

        let encoded = encode_record(schema, &input).unwrap();

        assert_eq!(
            column(&encoded, "exception_dates"),
            &ColumnValue::Text(Some(r#"["2024-01-30","2024-02-06"]"#.into()))
        );
        let ColumnValue::Text(Some(segments)) = column(&encoded, "segments") else {
            panic!("segments should be text");
        };
        assert_eq!(
            serde_json::from_str::<Value>(segments).unwrap(),
            json!([{ "startDate": "2024-01-29T08:00", "duration": 1 }])
        );
    }

    #[test]
    fn null_structured_field_is_null_column() {
        let schema = Collection::Calendars.schema();
        let input = record(json!({ "intervals": null }));

        let encoded = encode_record(schema, &input).unwrap();

        assert_eq!(column(&encoded, "intervals"), &ColumnValue::Text(None));
    }

    #[test]
    fn references_accept_integer_strings() {
        let schema = Collection::Assignments.schema();
        let input = record(json!({ "eventId": "12", "resourceId": 3 }));

        let encoded = encode_record(schema, &input).unwrap();

        assert_eq!(column(&encoded, "event_id"), &ColumnValue::Integer(Some(12)));
        assert_eq!(column(&encoded, "resource_id"), &ColumnValue::Integer(Some(3)));
    }

    #[test]
    fn unresolved_phantom_reference_is_rejected() {
        let schema = Collection::Assignments.schema();
        let input = record(json!({ "eventId": "_generated_e1", "resourceId": 1 }));

        let err = encode_record(schema, &input).unwrap_err();

        let CoreError::Validation(msg) = err;
        assert_eq!(msg, "assignments.eventId: unresolved reference to events");
    }

    #[test]
    fn rejected_values_are_not_echoed() {
        let schema = Collection::Events.schema();
        let input = record(json!({ "startDate": "secret-token-1234" }));

        let CoreError::Validation(msg) = encode_record(schema, &input).unwrap_err();

        assert_eq!(msg, "events.startDate: expected an ISO 8601 date");
    }

    #[test]
    fn resource_image_false_is_stored_as_null() {
        let schema = Collection::Resources.schema();
        let input = record(json!({ "name": "Room 1", "image": false }));

        let encoded = encode_record(schema, &input).unwrap();

        assert_eq!(column(&encoded, "image"), &ColumnValue::Text(None));
        // Other text fields still reject booleans.
        assert!(encode_record(schema, &record(json!({ "iconCls": false }))).is_err());
    }

    #[test]
    fn wrong_types_are_rejected() {
        let schema = Collection::Events.schema();
        for bad in [
            json!({ "allDay": "yes" }),
            json!({ "duration": [1] }),
            json!({ "startDate": 1706515200 }),
            json!({ "startDate": "next tuesday" }),
            json!({ "name": { "first": "A" } }),
        ] {
            assert!(
                encode_record(schema, &record(bad.clone())).is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn decode_parses_structured_text() {
        let schema = Collection::Events.schema();
        let mut row = record(json!({
            "id": 1,
            "name": "Checkup",
            "exceptionDates": "[\"2024-01-30\"]",
            "segments": null,
        }));

        let malformed = decode_record(schema, &mut row);

        assert!(malformed.is_empty());
        assert_eq!(row["exceptionDates"], json!(["2024-01-30"]));
        assert_eq!(row["segments"], Value::Null);
        assert_eq!(row["name"], "Checkup");
    }

    #[test]
    fn decode_keeps_malformed_text() {
        let schema = Collection::Calendars.schema();
        let mut row = record(json!({ "id": 1, "intervals": "not json" }));

        let malformed = decode_record(schema, &mut row);

        assert_eq!(malformed, ["intervals"]);
        assert_eq!(row["intervals"], "not json");
    }

    #[test]
    fn decode_omits_null_unspecified_time_is_working() {
        let schema = Collection::Calendars.schema();

        let mut unset = record(json!({ "id": 1, "name": "Day", "unspecifiedTimeIsWorking": null }));
        decode_record(schema, &mut unset);
        assert!(!unset.contains_key("unspecifiedTimeIsWorking"));

        let mut set = record(json!({ "id": 2, "name": "Night", "unspecifiedTimeIsWorking": false }));
        decode_record(schema, &mut set);
        assert_eq!(set["unspecifiedTimeIsWorking"], false);
    }

    #[test]
    fn timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 29)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        for input in [
            "2024-01-29T08:00",
            "2024-01-29T08:00:00",
            "2024-01-29T08:00:00.000",
            "2024-01-29 08:00:00",
            "2024-01-29T08:00:00+01:00",
            "2024-01-29T08:00:00Z",
        ] {
            assert_eq!(parse_timestamp(input), Some(expected), "{input}");
        }

        assert_eq!(
            parse_timestamp("2024-01-29"),
            NaiveDate::from_ymd_opt(2024, 1, 29).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("29/01/2024"), None);
    }

    #[test]
    fn parse_id_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_id(&json!(5)), Some(5));
        assert_eq!(parse_id(&json!("5")), Some(5));
        assert_eq!(parse_id(&json!(5.0)), Some(5));
        assert_eq!(parse_id(&json!("p1")), None);
        assert_eq!(parse_id(&Value::Null), None);
    }
}
