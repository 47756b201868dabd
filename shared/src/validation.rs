//! Input parsing and validation
//!
//! Numeric text typed by the user is parsed leniently: a leading number is
//! taken and anything after it ignored, and text that does not start with a
//! number becomes 0. These parsers never fail. Range checks on body
//! measurements use the `validator` crate derive.

use crate::errors::PreconditionError;
use crate::models::BodyMetric;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use thiserror::Error;
use validator::Validate;

/// Longest custom rest duration, in seconds
pub const MAX_CUSTOM_SECONDS: u32 = 600;

static LEADING_INT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid integer pattern"));

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)").expect("valid float pattern")
});

/// Parse a rep count. Empty, unparsable or negative input gives 0; a
/// number too large for `u32` saturates at `u32::MAX`.
pub fn parse_reps(text: &str) -> u32 {
    let Some(number) = LEADING_INT.captures(text).and_then(|c| c.get(1)) else {
        return 0;
    };
    let number = number.as_str();
    if number.starts_with('-') {
        return 0;
    }
    // only overflow can fail here, the pattern guarantees digits
    number
        .trim_start_matches('+')
        .parse::<u32>()
        .unwrap_or(u32::MAX)
}

/// Parse a weight in kg. A comma decimal separator is accepted
/// (`"52,5"` -> 52.5). Empty, unparsable or negative input gives 0.
pub fn parse_weight(text: &str) -> f64 {
    let normalized = text.replacen(',', ".", 1);
    LEADING_FLOAT
        .captures(&normalized)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n > 0.0)
        .unwrap_or(0.0)
}

/// Parse a body measurement (kg or cm). Same rules as [`parse_weight`].
pub fn parse_measurement(text: &str) -> f64 {
    parse_weight(text)
}

/// Keep only the ASCII digits of a text field
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Combine the minutes and seconds fields of the custom timer form.
///
/// Each field keeps its digits only and may hold at most two of them;
/// seconds must be below 60. Returns the total only when it lies in
/// `1..=600`.
pub fn custom_duration(minutes_text: &str, seconds_text: &str) -> Option<u32> {
    let minutes = digits_only(minutes_text);
    let seconds = digits_only(seconds_text);
    if minutes.len() > 2 || seconds.len() > 2 {
        return None;
    }

    let minutes: u32 = minutes.parse().unwrap_or(0);
    let seconds: u32 = seconds.parse().unwrap_or(0);
    if seconds >= 60 {
        return None;
    }

    let total = minutes * 60 + seconds;
    is_valid_custom_duration(total).then_some(total)
}

/// True for a custom rest duration the timer accepts
pub fn is_valid_custom_duration(total_seconds: u32) -> bool {
    (1..=MAX_CUSTOM_SECONDS).contains(&total_seconds)
}

/// Body measurements of a progress entry, 0 meaning "not recorded"
#[derive(Debug, Clone, Copy, Default, PartialEq, Validate)]
pub struct BodyMeasurements {
    #[validate(range(min = 0.0, max = 500.0))]
    pub weight: f64,
    #[validate(range(min = 0.0, max = 300.0))]
    pub waist: f64,
    #[validate(range(min = 0.0, max = 300.0))]
    pub chest: f64,
    #[validate(range(min = 0.0, max = 300.0))]
    pub hip: f64,
}

impl BodyMeasurements {
    /// Parse the four text fields of the progress form
    pub fn parse(weight: &str, waist: &str, chest: &str, hip: &str) -> Self {
        Self {
            weight: parse_measurement(weight),
            waist: parse_measurement(waist),
            chest: parse_measurement(chest),
            hip: parse_measurement(hip),
        }
    }

    pub fn get(&self, metric: BodyMetric) -> f64 {
        match metric {
            BodyMetric::Weight => self.weight,
            BodyMetric::Waist => self.waist,
            BodyMetric::Chest => self.chest,
            BodyMetric::Hip => self.hip,
        }
    }

    pub fn is_empty(&self) -> bool {
        BodyMetric::ALL.iter().all(|m| self.get(*m) == 0.0)
    }
}

fn metric_range(metric: BodyMetric) -> (f64, f64) {
    match metric {
        BodyMetric::Weight => (0.0, 500.0),
        BodyMetric::Waist | BodyMetric::Chest | BodyMetric::Hip => (0.0, 300.0),
    }
}

/// Save precondition for a progress entry: at least one non-zero
/// measurement or one photo, and every measurement within range.
pub fn check_progress_entry(
    measurements: &BodyMeasurements,
    photo_count: usize,
) -> Result<(), PreconditionError> {
    if measurements.is_empty() && photo_count == 0 {
        return Err(PreconditionError::EmptyProgressEntry);
    }

    if let Err(errors) = measurements.validate() {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_default();
        let metric = BodyMetric::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(&field))
            .unwrap_or(BodyMetric::Weight);
        let (min, max) = metric_range(metric);
        return Err(PreconditionError::OutOfRange {
            field: get_field_display_label(&field).to_string(),
            min,
            max,
        });
    }

    Ok(())
}

/// Map technical field names to user-friendly display labels
pub fn get_field_display_label(field_name: &str) -> &str {
    match field_name {
        "weight" => "Body weight",
        "waist" => "Waist",
        "chest" => "Chest",
        "hip" => "Hip",
        "export" => "Export file",
        _ => field_name,
    }
}

/// Validation error with field context
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{display_label}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub display_label: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            display_label: get_field_display_label(field).to_string(),
        }
    }

    /// Format as user-friendly error message
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.display_label, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("10", 10)]
    #[case("", 0)]
    #[case("  8", 8)]
    #[case("12abc", 12)]
    #[case("abc", 0)]
    #[case("-5", 0)]
    #[case("+7", 7)]
    #[case("3.9", 3)]
    #[case("99999999999", u32::MAX)]
    #[case("4294967295", u32::MAX)]
    #[case("-99999999999", 0)]
    fn test_parse_reps(#[case] input: &str, #[case] expected: u32) {
        assert_eq!(parse_reps(input), expected);
    }

    #[rstest]
    #[case("50", 50.0)]
    #[case("52.5", 52.5)]
    #[case("52,5", 52.5)]
    #[case("", 0.0)]
    #[case("kg", 0.0)]
    #[case("20kg", 20.0)]
    #[case(".5", 0.5)]
    #[case("-10", 0.0)]
    #[case("1,5,5", 1.5)]
    fn test_parse_weight(#[case] input: &str, #[case] expected: f64) {
        assert_eq!(parse_weight(input), expected);
    }

    #[rstest]
    #[case("2", "30", Some(150))]
    #[case("", "45", Some(45))]
    #[case("10", "", Some(600))]
    #[case("10", "1", None)]
    #[case("", "", None)]
    #[case("0", "0", None)]
    #[case("1", "75", None)]
    #[case("123", "0", None)]
    #[case("1m", "5s", Some(65))]
    fn test_custom_duration(
        #[case] minutes: &str,
        #[case] seconds: &str,
        #[case] expected: Option<u32>,
    ) {
        assert_eq!(custom_duration(minutes, seconds), expected);
    }

    #[test]
    fn test_empty_progress_entry_rejected() {
        let empty = BodyMeasurements::default();
        assert_eq!(
            check_progress_entry(&empty, 0),
            Err(PreconditionError::EmptyProgressEntry)
        );
        assert!(check_progress_entry(&empty, 1).is_ok());
    }

    #[test]
    fn test_progress_entry_out_of_range() {
        let measurements = BodyMeasurements {
            waist: 400.0,
            ..Default::default()
        };
        match check_progress_entry(&measurements, 0) {
            Err(PreconditionError::OutOfRange { field, max, .. }) => {
                assert_eq!(field, "Waist");
                assert_eq!(max, 300.0);
            }
            other => panic!("expected out of range, got {:?}", other),
        }
    }

    #[test]
    fn test_body_measurements_parse() {
        let m = BodyMeasurements::parse("80,4", "", "abc", "98");
        assert_eq!(m.weight, 80.4);
        assert_eq!(m.waist, 0.0);
        assert_eq!(m.chest, 0.0);
        assert_eq!(m.hip, 98.0);
        assert!(!m.is_empty());
    }

    #[test]
    fn test_validation_error() {
        let err = ValidationError::new("export", "missing field `userId`");
        assert_eq!(err.display_label, "Export file");
        assert_eq!(err.user_message(), "Export file: missing field `userId`");
        assert_eq!(err.to_string(), err.user_message());
    }

    #[test]
    fn test_out_of_range_uses_display_label() {
        let m = BodyMeasurements::parse("600", "", "", "");
        let err = check_progress_entry(&m, 0).unwrap_err();
        assert_eq!(err.to_string(), "Body weight must be between 0 and 500");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_parse_never_panics(text in ".{0,24}") {
            let _ = parse_reps(&text);
            let weight = parse_weight(&text);
            prop_assert!(weight >= 0.0 && weight.is_finite());
        }

        #[test]
        fn prop_reps_roundtrip(reps in 0u32..100_000) {
            prop_assert_eq!(parse_reps(&reps.to_string()), reps);
        }

        #[test]
        fn prop_custom_duration_in_range(minutes in 0u32..100, seconds in 0u32..60) {
            let total = minutes * 60 + seconds;
            let parsed = custom_duration(&minutes.to_string(), &seconds.to_string());
            if (1..=MAX_CUSTOM_SECONDS).contains(&total) {
                prop_assert_eq!(parsed, Some(total));
            } else {
                prop_assert_eq!(parsed, None);
            }
        }
    }
}
