use std::borrow::Cow;

use smallvec::SmallVec;
use time::{Date, Duration, OffsetDateTime};

/// One decoded row: a small inline buffer of cells. Most SAS datasets have a
/// modest, fixed column count, so a handful of columns fit without a heap
/// allocation per row.
pub type Row<'a> = SmallVec<[Value<'a>; 8]>;

/// Logical column type, derived from storage kind, format string, and width
/// by the type-inference rules in `parser::type_inference`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    String,
    Number,
    Date,
    DateTime,
    Time,
    Unknown,
}

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Date(Date),
    DateTime(OffsetDateTime),
    Duration(Duration),
    /// The missing-data marker. Distinct from an empty string and from 0.0.
    Absent,
}

impl Value<'_> {
    #[must_use]
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Text(text) => Value::Text(Cow::Owned(text.into_owned())),
            Value::Number(n) => Value::Number(n),
            Value::Date(d) => Value::Date(d),
            Value::DateTime(dt) => Value::DateTime(dt),
            Value::Duration(duration) => Value::Duration(duration),
            Value::Absent => Value::Absent,
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}
