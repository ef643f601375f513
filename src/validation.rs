//! Field-level validation for user-supplied records
//!
//! Validators are pure: they read a JSON value and report every violation at
//! once instead of stopping at the first one. They never touch storage.

use serde::Serialize;
use serde_json::Value;

/// Youngest supported student age
pub const MIN_AGE: i64 = 13;
/// Oldest supported student age
pub const MAX_AGE: i64 = 30;
/// Confidence bounds (percent)
pub const MIN_CONFIDENCE: f64 = 0.0;
pub const MAX_CONFIDENCE: f64 = 100.0;

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Treat `null`, `""` and missing fields alike
fn present<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
    match value.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}

/// Numbers, or strings holding a number (form inputs arrive as text)
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Validate a user profile: `name`, `age` and `class` are required, and
/// `age` must be a number between 13 and 30 inclusive.
pub fn validate_user_profile(profile: &Value) -> ValidationReport {
    let mut errors = Vec::new();

    if present(profile, "name").is_none() {
        errors.push("Name is required".to_string());
    }

    match present(profile, "age") {
        None => errors.push("Age is required".to_string()),
        Some(age) => {
            let in_range = as_number(age).is_some_and(|a| (MIN_AGE as f64..=MAX_AGE as f64).contains(&a));
            if !in_range {
                errors.push(format!("Age must be between {} and {}", MIN_AGE, MAX_AGE));
            }
        }
    }

    if present(profile, "class").is_none() {
        errors.push("Class is required".to_string());
    }

    ValidationReport::from_errors(errors)
}

/// Validate quiz results: `answers` must be a non-empty map, `primaryStream`
/// is required, and `confidence` must lie in [0, 100].
///
/// An empty `answers` map counts as missing.
pub fn validate_quiz_results(results: &Value) -> ValidationReport {
    let mut errors = Vec::new();

    let has_answers = matches!(results.get("answers"), Some(Value::Object(map)) if !map.is_empty());
    if !has_answers {
        errors.push("Quiz answers are required".to_string());
    }

    if present(results, "primaryStream").is_none() {
        errors.push("Primary stream is required".to_string());
    }

    match results.get("confidence") {
        None | Some(Value::Null) => errors.push("Confidence is required".to_string()),
        Some(c) => {
            let in_range = as_number(c)
                .is_some_and(|c| (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&c));
            if !in_range {
                errors.push(format!(
                    "Confidence must be between {} and {}",
                    MIN_CONFIDENCE, MAX_CONFIDENCE
                ));
            }
        }
    }

    ValidationReport::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_age_out_of_range() {
        let report = validate_user_profile(&json!({"name": "A", "age": 10, "class": "X"}));
        assert_eq!(
            report,
            ValidationReport {
                is_valid: false,
                errors: vec!["Age must be between 13 and 30".to_string()],
            }
        );
    }

    #[test]
    fn test_profile_valid_bounds() {
        for age in [13, 30] {
            let report = validate_user_profile(&json!({"name": "Ravi", "age": age, "class": "12"}));
            assert!(report.is_valid, "age {} should be accepted", age);
        }
        // Form fields come through as strings
        assert!(validate_user_profile(&json!({"name": "Ravi", "age": "17", "class": "12"})).is_valid);
    }

    #[test]
    fn test_profile_fractional_age_in_range() {
        assert!(validate_user_profile(&json!({"name": "A", "age": 15.5, "class": "X"})).is_valid);
        assert!(validate_user_profile(&json!({"name": "A", "age": "29.9", "class": "X"})).is_valid);
        assert!(!validate_user_profile(&json!({"name": "A", "age": 30.5, "class": "X"})).is_valid);
    }

    #[test]
    fn test_profile_errors_accumulate() {
        let report = validate_user_profile(&json!({"name": "", "age": 31.5}));
        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            vec![
                "Name is required",
                "Age must be between 13 and 30",
                "Class is required",
            ]
        );

        let report = validate_user_profile(&json!({}));
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.errors[1], "Age is required");
    }

    #[test]
    fn test_quiz_confidence_out_of_range() {
        let report = validate_quiz_results(&json!({
            "answers": {},
            "primaryStream": "Science",
            "confidence": 150
        }));
        assert!(!report.is_valid);
        assert!(report.errors.contains(&"Confidence must be between 0 and 100".to_string()));
    }

    #[test]
    fn test_quiz_empty_answers_count_as_missing() {
        let report = validate_quiz_results(&json!({
            "answers": {},
            "primaryStream": "Science",
            "confidence": 80
        }));
        assert_eq!(report.errors, vec!["Quiz answers are required"]);
    }

    #[test]
    fn test_quiz_valid() {
        let report = validate_quiz_results(&json!({
            "answers": {"q1": "b", "q2": "a"},
            "primaryStream": "Commerce",
            "confidence": 0
        }));
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_quiz_everything_missing() {
        let report = validate_quiz_results(&json!({"answers": ["q1"]}));
        assert_eq!(
            report.errors,
            vec![
                "Quiz answers are required",
                "Primary stream is required",
                "Confidence is required",
            ]
        );
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let json = serde_json::to_value(validate_user_profile(&json!({}))).unwrap();
        assert_eq!(json["isValid"], false);
        assert!(json["errors"].is_array());
    }
}
