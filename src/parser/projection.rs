//! Column projection serializer (§4.9.1): given a row-bytes slice, writes
//! each selected column's decoded cell to the next destination slot.

use crate::metadata::ColumnInfo;
use crate::options::ReadOptions;
use crate::parser::field;
use crate::value::{Row, Value};

/// Resolved column selection: either every column (file order) or an
/// explicit subset (still enumerated in file order, per §4.9.1).
#[derive(Debug, Clone)]
pub(crate) enum Projection {
    Full,
    Subset(Vec<usize>),
}

impl Projection {
    /// Resolves `options` against `columns`. Indices win over names when
    /// both are supplied; an empty/absent selection means "every column".
    pub(crate) fn resolve(options: &ReadOptions, columns: &[ColumnInfo]) -> Self {
        if let Some(indices) = &options.selected_column_indices {
            if indices.is_empty() {
                return Self::Full;
            }
            let mut selected: Vec<usize> = columns
                .iter()
                .map(|column| column.index)
                .filter(|idx| indices.contains(idx))
                .collect();
            selected.sort_unstable();
            return Self::Subset(selected);
        }
        if let Some(names) = &options.selected_column_names {
            if names.is_empty() {
                return Self::Full;
            }
            let selected: Vec<usize> = columns
                .iter()
                .filter(|column| names.contains(&column.name))
                .map(|column| column.index)
                .collect();
            return Self::Subset(selected);
        }
        Self::Full
    }

    #[must_use]
    pub(crate) fn width(&self, column_count: usize) -> usize {
        match self {
            Self::Full => column_count,
            Self::Subset(indices) => indices.len(),
        }
    }
}

/// Decodes `row` into `dest`, writing one cell per selected column in file
/// order. `dest` must have exactly `projection.width(columns.len())` slots.
pub(crate) fn project_row(
    row: &[u8],
    columns: &[ColumnInfo],
    projection: &Projection,
    codec: &'static encoding_rs::Encoding,
    endian: crate::metadata::Endianness,
) -> crate::error::Result<Row<'static>> {
    match projection {
        Projection::Full => columns
            .iter()
            .map(|column| decode_cell(row, column, codec, endian))
            .collect(),
        Projection::Subset(indices) => indices
            .iter()
            .map(|&idx| decode_cell(row, &columns[idx], codec, endian))
            .collect(),
    }
}

fn decode_cell(
    row: &[u8],
    column: &ColumnInfo,
    codec: &'static encoding_rs::Encoding,
    endian: crate::metadata::Endianness,
) -> crate::error::Result<Value<'static>> {
    use crate::error::Section;
    use crate::value::LogicalType;

    let start = column.offset as usize;
    let end = start + column.length as usize;
    let raw = row.get(start..end).ok_or(crate::error::Error::Truncation {
        section: Section::Column {
            index: column.index as u32,
        },
    })?;

    match column.logical_type {
        LogicalType::String => Ok(field::decode_text(raw, codec).into_owned()),
        LogicalType::Number => field::decode_number(
            raw,
            endian,
            Section::Column {
                index: column.index as u32,
            },
        ),
        LogicalType::Date => {
            let number = field::decode_number(
                raw,
                endian,
                Section::Column {
                    index: column.index as u32,
                },
            )?;
            let normalized = crate::parser::type_inference::normalize_format(&column.format);
            Ok(field::decode_date(
                number,
                crate::parser::type_inference::is_date_from_datetime_format(&normalized),
            ))
        }
        LogicalType::DateTime => {
            let number = field::decode_number(
                raw,
                endian,
                Section::Column {
                    index: column.index as u32,
                },
            )?;
            Ok(field::decode_datetime(number))
        }
        LogicalType::Time => {
            let number = field::decode_number(
                raw,
                endian,
                Section::Column {
                    index: column.index as u32,
                },
            )?;
            Ok(field::decode_time(number))
        }
        LogicalType::Unknown => Ok(Value::Absent),
    }
}
