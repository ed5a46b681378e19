//! Type inference (§4.5): derive a logical column type from storage kind,
//! raw format string, and byte width.

use crate::metadata::StorageKind;
use crate::value::LogicalType;

const DATETIME_PREFIXES: &[&str] = &[
    "B8601DT", "E8601DT", "IS8601DT", "B8601DZ", "E8601DZ", "IS8601DZ",
];
const TIME_PREFIXES_8601: &[&str] = &[
    "B8601TM", "E8601TM", "IS8601TM", "B8601TN", "E8601TN", "IS8601TN", "E8601LZ",
];
const DATE_PREFIXES_8601: &[&str] = &[
    "B8601DA", "E8601DA", "IS8601DA", "B8601DN", "E8601DN", "IS8601DN",
];
const DATE_FROM_DATETIME_PREFIXES: &[&str] = &["B8601DN", "E8601DN", "IS8601DN"];
const TIME_PREFIXES: &[&str] = &[
    "TIME", "HHMM", "MMSS", "HMS", "TIMEAMPM", "HOUR", "MINUTE", "SECOND",
];
const DATE_PREFIXES: &[&str] = &[
    "DATE", "DAY", "YYMMDD", "MMDDYY", "DDMMYY", "JULIAN", "JULDAY", "MONYY", "MMYY", "YYMM",
    "MONNAME", "MONTH", "WEEKDAT", "WORDDAT", "EURDF", "NLDAT", "YYQ", "YYMON", "YEAR", "WEEK",
    "QTR", "QUARTER", "DOWNAME",
];

/// "date-from-datetime" formats (§4.4): only `B8601DN`/`E8601DN`/`IS8601DN`
/// decode as seconds since the SAS epoch, truncated to the calendar date.
/// The sibling `…DA` formats (also `Date`-typed per §4.5 step 7) are whole
/// days since the epoch, like every other date format.
#[must_use]
pub fn is_date_from_datetime_format(normalized_format: &str) -> bool {
    DATE_FROM_DATETIME_PREFIXES
        .iter()
        .any(|prefix| normalized_format.starts_with(prefix))
}

/// Normalizes a raw format string: trim, upper-case, strip any trailing run
/// of `[0-9.,]` (width/precision decorations).
#[must_use]
pub fn normalize_format(raw_format: &str) -> String {
    let upper = raw_format.trim().to_ascii_uppercase();
    upper
        .trim_end_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ',')
        .to_string()
}

/// Computes the logical type per the 14-step rule chain.
#[must_use]
pub fn infer_type(storage: StorageKind, raw_format: &str, length: u64) -> LogicalType {
    if storage == StorageKind::String {
        return LogicalType::String;
    }
    if storage != StorageKind::Number {
        return LogicalType::Unknown;
    }

    let normalized = normalize_format(raw_format);

    if normalized.is_empty() || matches!(length, 0 | 1 | 2) {
        return LogicalType::Number;
    }
    if DATETIME_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        return LogicalType::DateTime;
    }
    if TIME_PREFIXES_8601
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        return LogicalType::Time;
    }
    if DATE_PREFIXES_8601
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        return LogicalType::Date;
    }
    if normalized.contains("DATETIME") {
        return LogicalType::DateTime;
    }
    if TIME_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        return LogicalType::Time;
    }
    if DATE_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        return LogicalType::Date;
    }
    if normalized.starts_with("DT") || normalized.ends_with("DT") || normalized.ends_with("DZ") {
        return LogicalType::DateTime;
    }
    if normalized.ends_with("TM") || normalized.ends_with("TN") {
        return LogicalType::Time;
    }
    if normalized.ends_with("DA") || normalized.ends_with("DN") {
        return LogicalType::Date;
    }
    LogicalType::Number
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_storage_always_wins() {
        assert_eq!(
            infer_type(StorageKind::String, "DATETIME20.", 8),
            LogicalType::String
        );
    }

    #[test]
    fn short_numeric_widths_are_plain_numbers() {
        assert_eq!(infer_type(StorageKind::Number, "DATE9.", 1), LogicalType::Number);
        assert_eq!(infer_type(StorageKind::Number, "", 8), LogicalType::Number);
    }

    #[test]
    fn iso8601_date_from_datetime_format() {
        assert_eq!(
            infer_type(StorageKind::Number, "E8601DN10.", 8),
            LogicalType::Date
        );
        assert!(is_date_from_datetime_format("E8601DN10"));
    }

    #[test]
    fn iso8601_da_formats_classify_as_date_but_are_not_date_from_datetime() {
        assert_eq!(
            infer_type(StorageKind::Number, "E8601DA10.", 8),
            LogicalType::Date
        );
        assert!(!is_date_from_datetime_format("E8601DA10"));
        assert!(!is_date_from_datetime_format("B8601DA"));
        assert!(!is_date_from_datetime_format("IS8601DA"));
    }

    #[test]
    fn named_date_formats() {
        assert_eq!(infer_type(StorageKind::Number, "YYMMDD10.", 8), LogicalType::Date);
        assert_eq!(infer_type(StorageKind::Number, "MONYY7.", 8), LogicalType::Date);
    }

    #[test]
    fn named_time_and_datetime_formats() {
        assert_eq!(infer_type(StorageKind::Number, "HHMM5.", 8), LogicalType::Time);
        assert_eq!(
            infer_type(StorageKind::Number, "DATETIME20.", 8),
            LogicalType::DateTime
        );
    }

    #[test]
    fn suffix_fallback_rules() {
        assert_eq!(infer_type(StorageKind::Number, "FOODT", 8), LogicalType::DateTime);
        assert_eq!(infer_type(StorageKind::Number, "FOOTM", 8), LogicalType::Time);
        assert_eq!(infer_type(StorageKind::Number, "FOODA", 8), LogicalType::Date);
        assert_eq!(infer_type(StorageKind::Number, "FOOBAR", 8), LogicalType::Number);
    }
}
