//! Reusable rule checks
//!
//! Each check receives the label of the value being checked and the value
//! itself, already known to have the right type. Messages follow the
//! `"<label>" must ...` shape reported to clients.

use crate::core::schema::{Constraint, SchemaKind};
use serde_json::Value;
use validator::{ValidateEmail, ValidateLength, ValidateRange, ValidateUrl};

/// Whether a constraint can be evaluated against values of `kind`
pub fn applies_to(constraint: &Constraint, kind: &SchemaKind) -> bool {
    match constraint {
        Constraint::Min(_) | Constraint::Max(_) => {
            matches!(kind, SchemaKind::Number | SchemaKind::Integer)
        }
        Constraint::MinLength(_) | Constraint::MaxLength(_) => {
            matches!(kind, SchemaKind::String | SchemaKind::Array(_))
        }
        Constraint::Email | Constraint::Url | Constraint::Uuid | Constraint::Pattern(_) => {
            matches!(kind, SchemaKind::String)
        }
    }
}

/// Evaluate one constraint
pub fn check(constraint: &Constraint, label: &str, value: &Value) -> Result<(), String> {
    match constraint {
        Constraint::Min(limit) => min(*limit)(label, value),
        Constraint::Max(limit) => max(*limit)(label, value),
        Constraint::MinLength(limit) => min_length(*limit)(label, value),
        Constraint::MaxLength(limit) => max_length(*limit)(label, value),
        Constraint::Email => email()(label, value),
        Constraint::Url => url()(label, value),
        Constraint::Uuid => uuid()(label, value),
        Constraint::Pattern(regex) => {
            let Some(s) = value.as_str() else {
                return Ok(());
            };
            if regex.is_match(s) {
                Ok(())
            } else {
                Err(format!(
                    "\"{}\" with value \"{}\" fails to match the required pattern: /{}/",
                    label,
                    s,
                    regex.as_str()
                ))
            }
        }
    }
}

/// Rule: number must be at least `limit`
pub fn min(limit: f64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |label: &str, value: &Value| match value.as_f64() {
        Some(num) if !num.validate_range(Some(limit), None, None, None) => Err(format!(
            "\"{}\" must be greater than or equal to {}",
            label, limit
        )),
        _ => Ok(()),
    }
}

/// Rule: number must be at most `limit`
pub fn max(limit: f64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |label: &str, value: &Value| match value.as_f64() {
        Some(num) if !num.validate_range(None, Some(limit), None, None) => Err(format!(
            "\"{}\" must be less than or equal to {}",
            label, limit
        )),
        _ => Ok(()),
    }
}

/// Rule: string (characters) or array (items) must be at least `limit` long
pub fn min_length(limit: u64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |label: &str, value: &Value| match value {
        Value::String(s) if !s.validate_length(Some(limit), None, None) => Err(format!(
            "\"{}\" length must be at least {} characters long",
            label, limit
        )),
        Value::Array(items) if !items.validate_length(Some(limit), None, None) => Err(format!(
            "\"{}\" must contain at least {} items",
            label, limit
        )),
        _ => Ok(()),
    }
}

/// Rule: string (characters) or array (items) must be at most `limit` long
pub fn max_length(limit: u64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |label: &str, value: &Value| match value {
        Value::String(s) if !s.validate_length(None, Some(limit), None) => Err(format!(
            "\"{}\" length must be less than or equal to {} characters long",
            label, limit
        )),
        Value::Array(items) if !items.validate_length(None, Some(limit), None) => Err(format!(
            "\"{}\" must contain less than or equal to {} items",
            label, limit
        )),
        _ => Ok(()),
    }
}

/// Rule: string must be an email address
pub fn email() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |label: &str, value: &Value| match value {
        Value::String(s) if !s.validate_email() => {
            Err(format!("\"{}\" must be a valid email", label))
        }
        _ => Ok(()),
    }
}

/// Rule: string must be an absolute URL
pub fn url() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |label: &str, value: &Value| match value {
        Value::String(s) if !s.validate_url() => Err(format!("\"{}\" must be a valid uri", label)),
        _ => Ok(()),
    }
}

/// Rule: string must be a UUID
pub fn uuid() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |label: &str, value: &Value| match value {
        Value::String(s) if uuid::Uuid::parse_str(s).is_err() => {
            Err(format!("\"{}\" must be a valid uuid", label))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use serde_json::json;

    // === min() / max() ===

    #[test]
    fn test_min_below_limit_returns_error() {
        let rule = min(3.0);
        let result = rule("age", &json!(2));
        assert_eq!(
            result.unwrap_err(),
            "\"age\" must be greater than or equal to 3"
        );
    }

    #[test]
    fn test_min_at_limit_returns_ok() {
        assert!(min(3.0)("age", &json!(3)).is_ok());
    }

    #[test]
    fn test_max_above_limit_returns_error() {
        let result = max(100.0)("score", &json!(101.5));
        assert!(result.unwrap_err().contains("less than or equal to 100"));
    }

    #[test]
    fn test_max_non_number_passthrough() {
        assert!(max(1.0)("score", &json!("big")).is_ok());
    }

    // === min_length() / max_length() ===

    #[test]
    fn test_min_length_counts_characters() {
        let rule = min_length(3);
        assert!(rule("name", &json!("héé")).is_ok());
        assert!(rule("name", &json!("ab")).is_err());
    }

    #[test]
    fn test_max_length_on_arrays() {
        let rule = max_length(2);
        assert!(rule("tags", &json!([1, 2])).is_ok());
        assert_eq!(
            rule("tags", &json!([1, 2, 3])).unwrap_err(),
            "\"tags\" must contain less than or equal to 2 items"
        );
    }

    // === email() / url() / uuid() ===

    #[test]
    fn test_email() {
        let rule = email();
        assert!(rule("email", &json!("test@test.com")).is_ok());
        assert_eq!(
            rule("email", &json!("not-an-email")).unwrap_err(),
            "\"email\" must be a valid email"
        );
    }

    #[test]
    fn test_url() {
        let rule = url();
        assert!(rule("site", &json!("https://example.com/a?b=1")).is_ok());
        assert!(rule("site", &json!("not a url")).is_err());
    }

    #[test]
    fn test_uuid() {
        let rule = uuid();
        assert!(rule("id", &json!(uuid::Uuid::new_v4().to_string())).is_ok());
        assert!(rule("id", &json!("1234")).is_err());
    }

    // === pattern ===

    #[test]
    fn test_pattern_reports_value_and_regex() {
        let constraint = Constraint::Pattern(Regex::new(r"^[A-Z]{3}$").unwrap());
        assert!(check(&constraint, "code", &json!("ABC")).is_ok());
        assert_eq!(
            check(&constraint, "code", &json!("abc")).unwrap_err(),
            "\"code\" with value \"abc\" fails to match the required pattern: /^[A-Z]{3}$/"
        );
    }

    // === applies_to() ===

    #[test]
    fn test_applies_to() {
        assert!(applies_to(&Constraint::Email, &SchemaKind::String));
        assert!(!applies_to(&Constraint::Email, &SchemaKind::Number));
        assert!(applies_to(&Constraint::MinLength(1), &SchemaKind::Array(None)));
        assert!(!applies_to(&Constraint::Min(1.0), &SchemaKind::String));
    }
}
