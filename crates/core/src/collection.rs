//! Declarative schemas for the five scheduler collections.
//!
//! Each collection maps to one table. A [`CollectionSchema`] lists the
//! fields the backend persists, the SQL column backing each one, and how the
//! JSON value is coerced for storage. The generic create/update/delete and
//! load routines are driven entirely by these tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the scheduler widget's record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Calendars,
    Resources,
    Events,
    Assignments,
    Dependencies,
}

impl Collection {
    /// Order in which a sync batch is applied.
    ///
    /// Parents come before the children that may reference them, so phantom
    /// ids created earlier in the batch can be resolved for later collections.
    pub const SYNC_ORDER: [Collection; 5] = [
        Collection::Calendars,
        Collection::Resources,
        Collection::Events,
        Collection::Assignments,
        Collection::Dependencies,
    ];

    /// Key used for this collection in `/load` and `/sync` payloads.
    pub fn key(self) -> &'static str {
        match self {
            Collection::Calendars => "calendars",
            Collection::Resources => "resources",
            Collection::Events => "events",
            Collection::Assignments => "assignments",
            Collection::Dependencies => "dependencies",
        }
    }

    /// Static schema for this collection.
    pub fn schema(self) -> &'static CollectionSchema {
        match self {
            Collection::Calendars => &CALENDARS,
            Collection::Resources => &RESOURCES,
            Collection::Events => &EVENTS,
            Collection::Assignments => &ASSIGNMENTS,
            Collection::Dependencies => &DEPENDENCIES,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How a field's JSON value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    /// Wall-clock date and time, stored without a zone.
    Timestamp,
    /// Foreign key to another collection. May hold a phantom id until the
    /// batch resolves it.
    Reference(Collection),
    /// Composite value (array or object) stored as JSON text.
    Structured,
}

/// A persisted field of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// camelCase name used on the wire.
    pub name: &'static str,
    /// SQL column name.
    pub column: &'static str,
    pub kind: FieldKind,
    /// Drop the key from loaded rows when the column is NULL.
    pub omit_when_null: bool,
    /// Store a JSON `false` as NULL. The widget sends `false` for "no value"
    /// on some text fields, e.g. a resource without an image.
    pub false_is_null: bool,
}

impl Field {
    const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            omit_when_null: false,
            false_is_null: false,
        }
    }

    const fn omitted_when_null(mut self) -> Self {
        self.omit_when_null = true;
        self
    }

    const fn false_as_null(mut self) -> Self {
        self.false_is_null = true;
        self
    }
}

/// Table mapping for a collection.
#[derive(Debug)]
pub struct CollectionSchema {
    pub collection: Collection,
    pub table: &'static str,
    /// Writable fields, in column order. The `id` column is implicit.
    pub fields: &'static [Field],
}

impl CollectionSchema {
    /// Look up a writable field by its wire name.
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields stored as serialized JSON text.
    pub fn structured_fields(&self) -> impl Iterator<Item = &'static Field> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Structured)
    }

    /// Reference fields paired with the collection they point at.
    pub fn references(&self) -> impl Iterator<Item = (&'static Field, Collection)> {
        self.fields.iter().filter_map(|f| match f.kind {
            FieldKind::Reference(target) => Some((f, target)),
            _ => None,
        })
    }
}

static CALENDARS: CollectionSchema = CollectionSchema {
    collection: Collection::Calendars,
    table: "scheduler_calendars",
    fields: &[
        Field::new("name", "name", FieldKind::Text),
        Field::new("intervals", "intervals", FieldKind::Structured),
        Field::new(
            "unspecifiedTimeIsWorking",
            "unspecified_time_is_working",
            FieldKind::Boolean,
        )
        .omitted_when_null(),
    ],
};

static RESOURCES: CollectionSchema = CollectionSchema {
    collection: Collection::Resources,
    table: "scheduler_resources",
    fields: &[
        Field::new("name", "name", FieldKind::Text),
        Field::new("role", "role", FieldKind::Text),
        Field::new("eventColor", "event_color", FieldKind::Text),
        Field::new("iconCls", "icon_cls", FieldKind::Text),
        Field::new("image", "image", FieldKind::Text).false_as_null(),
        Field::new(
            "calendar",
            "calendar_id",
            FieldKind::Reference(Collection::Calendars),
        ),
    ],
};

static EVENTS: CollectionSchema = CollectionSchema {
    collection: Collection::Events,
    table: "scheduler_events",
    fields: &[
        Field::new("name", "name", FieldKind::Text),
        Field::new("startDate", "start_date", FieldKind::Timestamp),
        Field::new("endDate", "end_date", FieldKind::Timestamp),
        Field::new("duration", "duration", FieldKind::Float),
        Field::new("durationUnit", "duration_unit", FieldKind::Text),
        Field::new("allDay", "all_day", FieldKind::Boolean),
        Field::new(
            "resourceId",
            "resource_id",
            FieldKind::Reference(Collection::Resources),
        ),
        Field::new(
            "calendar",
            "calendar_id",
            FieldKind::Reference(Collection::Calendars),
        ),
        Field::new("eventColor", "event_color", FieldKind::Text),
        Field::new("iconCls", "icon_cls", FieldKind::Text),
        Field::new("cls", "cls", FieldKind::Text),
        Field::new("recurrenceRule", "recurrence_rule", FieldKind::Text),
        Field::new("exceptionDates", "exception_dates", FieldKind::Structured),
        Field::new("segments", "segments", FieldKind::Structured),
        Field::new("readOnly", "read_only", FieldKind::Boolean),
        Field::new("draggable", "draggable", FieldKind::Boolean),
        Field::new("patient", "patient", FieldKind::Text),
        Field::new("requiredRole", "required_role", FieldKind::Text),
        Field::new("confirmed", "confirmed", FieldKind::Boolean),
    ],
};

static ASSIGNMENTS: CollectionSchema = CollectionSchema {
    collection: Collection::Assignments,
    table: "scheduler_assignments",
    fields: &[
        Field::new(
            "eventId",
            "event_id",
            FieldKind::Reference(Collection::Events),
        ),
        Field::new(
            "resourceId",
            "resource_id",
            FieldKind::Reference(Collection::Resources),
        ),
        Field::new("units", "units", FieldKind::Float),
    ],
};

static DEPENDENCIES: CollectionSchema = CollectionSchema {
    collection: Collection::Dependencies,
    table: "scheduler_dependencies",
    fields: &[
        Field::new(
            "from",
            "from_event_id",
            FieldKind::Reference(Collection::Events),
        ),
        Field::new("to", "to_event_id", FieldKind::Reference(Collection::Events)),
        Field::new("type", "dependency_type", FieldKind::Integer),
        Field::new("cls", "cls", FieldKind::Text),
        Field::new("lag", "lag", FieldKind::Float),
        Field::new("lagUnit", "lag_unit", FieldKind::Text),
        Field::new("fromSide", "from_side", FieldKind::Text),
        Field::new("toSide", "to_side", FieldKind::Text),
        Field::new("exceptionDates", "exception_dates", FieldKind::Structured),
    ],
};

// ---------------------------------------------------------------------------
// Deployment variants
// ---------------------------------------------------------------------------

/// Which widget flavour the backend serves.
///
/// The basic scheduler assigns events to a single resource through
/// `events.resourceId` and never loads assignments or calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentVariant {
    Basic,
    #[default]
    Pro,
}

impl DeploymentVariant {
    /// Collections returned by `/load`, in response order.
    pub fn collections(self) -> &'static [Collection] {
        match self {
            DeploymentVariant::Basic => &[
                Collection::Resources,
                Collection::Events,
                Collection::Dependencies,
            ],
            DeploymentVariant::Pro => &[
                Collection::Resources,
                Collection::Events,
                Collection::Dependencies,
                Collection::Assignments,
                Collection::Calendars,
            ],
        }
    }

    /// Whether `/load` includes the `project` block.
    pub fn includes_project(self) -> bool {
        matches!(self, DeploymentVariant::Pro)
    }
}

impl FromStr for DeploymentVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(DeploymentVariant::Basic),
            "pro" => Ok(DeploymentVariant::Pro),
            other => Err(format!("unknown deployment variant '{other}'")),
        }
    }
}
