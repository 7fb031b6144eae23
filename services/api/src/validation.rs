//! Input validation utilities
//!
//! Validators operate on raw JSON values so handlers can report problems
//! before any typed decoding or database work happens. They are pure and
//! deterministic.

use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Validation failure with a human-readable message and an HTTP-style
/// status code (default 400)
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub message: String,
    pub status: u16,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        ValidationError {
            message: message.into(),
            status: 400,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check that all required fields are present and non-null, reporting every
/// missing field in a single error
pub fn validate_required_fields(
    data: &Map<String, Value>,
    required: &[&str],
) -> Result<(), ValidationError> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|field| data.get(**field).is_none_or(Value::is_null))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Parse a value as a real number and check that it is strictly positive
///
/// Numeric strings are accepted alongside JSON numbers.
pub fn validate_positive_number(value: &Value, field_name: &str) -> Result<f64, ValidationError> {
    let num = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match num {
        Some(n) if n > 0.0 => Ok(n),
        Some(_) => Err(ValidationError::new(format!(
            "{field_name} must be positive"
        ))),
        None => Err(ValidationError::new(format!(
            "{field_name} must be a valid number"
        ))),
    }
}

/// Parse a value as an integer and check it against optional inclusive bounds
pub fn validate_integer(
    value: &Value,
    field_name: &str,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<i64, ValidationError> {
    let num = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let num = num.ok_or_else(|| {
        ValidationError::new(format!("{field_name} must be a valid integer"))
    })?;

    if let Some(min) = min {
        if num < min {
            return Err(ValidationError::new(format!(
                "{field_name} must be at least {min}"
            )));
        }
    }
    if let Some(max) = max {
        if num > max {
            return Err(ValidationError::new(format!(
                "{field_name} must be at most {max}"
            )));
        }
    }

    Ok(num)
}

/// Parse a value as an ISO calendar date (`YYYY-MM-DD`)
pub fn validate_date(value: &Value, field_name: &str) -> Result<NaiveDate, ValidationError> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .ok_or_else(|| {
            ValidationError::new(format!("{field_name} must be a date in YYYY-MM-DD format"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().expect("object literal").clone()
    }

    #[test]
    fn required_fields_pass_when_all_present() {
        let data = map(json!({"workout_type": 3, "date": "2024-01-01"}));
        assert!(validate_required_fields(&data, &["workout_type"]).is_ok());
    }

    #[test]
    fn required_fields_report_all_missing_in_one_message() {
        let data = map(json!({"weight": 100}));
        let err = validate_required_fields(&data, &["workout_id", "exercise_id", "weight", "reps"])
            .unwrap_err();
        assert_eq!(
            err.message,
            "Missing required fields: workout_id, exercise_id, reps"
        );
        assert_eq!(err.status, 400);
    }

    #[test]
    fn required_fields_treat_null_as_missing() {
        let data = map(json!({"weight": null}));
        let err = validate_required_fields(&data, &["weight"]).unwrap_err();
        assert_eq!(err.message, "Missing required fields: weight");
    }

    #[test]
    fn positive_number_accepts_numbers_and_numeric_strings() {
        assert_eq!(validate_positive_number(&json!(102.5), "weight"), Ok(102.5));
        assert_eq!(validate_positive_number(&json!("60"), "weight"), Ok(60.0));
    }

    #[test]
    fn positive_number_rejects_zero_and_negative() {
        assert_eq!(
            validate_positive_number(&json!(0), "weight").unwrap_err().message,
            "weight must be positive"
        );
        assert_eq!(
            validate_positive_number(&json!(-5.0), "weight").unwrap_err().message,
            "weight must be positive"
        );
    }

    #[test]
    fn positive_number_rejects_non_numeric() {
        for bad in [json!("heavy"), json!(null), json!(true), json!([1])] {
            let err = validate_positive_number(&bad, "weight").unwrap_err();
            assert_eq!(err.message, "weight must be a valid number");
        }
    }

    #[test]
    fn integer_accepts_inclusive_bounds() {
        assert_eq!(validate_integer(&json!(1), "rpe", Some(1), Some(10)), Ok(1));
        assert_eq!(validate_integer(&json!(10), "rpe", Some(1), Some(10)), Ok(10));
        assert_eq!(validate_integer(&json!("7"), "rpe", Some(1), Some(10)), Ok(7));
    }

    #[test]
    fn integer_rejects_out_of_range() {
        assert_eq!(
            validate_integer(&json!(0), "rpe", Some(1), Some(10)).unwrap_err().message,
            "rpe must be at least 1"
        );
        assert_eq!(
            validate_integer(&json!(11), "rpe", Some(1), Some(10)).unwrap_err().message,
            "rpe must be at most 10"
        );
    }

    #[test]
    fn integer_rejects_non_integers() {
        for bad in [json!(2.5), json!("three"), json!(null)] {
            let err = validate_integer(&bad, "reps", Some(1), None).unwrap_err();
            assert_eq!(err.message, "reps must be a valid integer");
        }
    }

    #[test]
    fn integer_bounds_are_optional() {
        assert_eq!(validate_integer(&json!(-40), "offset", None, None), Ok(-40));
    }

    #[test]
    fn date_parses_iso_calendar_dates() {
        let date = validate_date(&json!("2024-01-31"), "date").expect("valid date");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid ymd"));
    }

    #[test]
    fn date_rejects_malformed_input() {
        for bad in [json!("31/01/2024"), json!("2024-13-01"), json!(20240101)] {
            let err = validate_date(&bad, "date").unwrap_err();
            assert_eq!(err.message, "date must be a date in YYYY-MM-DD format");
        }
    }
}
