//! Turns untrusted upstream JSON into typed records.
//!
//! Every payload coming from Riot, the catalog or the stats service goes
//! through [`parse_with_log`]. Structural problems are reported by `serde`,
//! semantic ones by the payload's [`Validate`] impl. Failures are logged with
//! the schema name and handed back as a [`ValidationError`] so callers can
//! degrade (omit a field, fall back to the cache) instead of trusting the data.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// A single problem found in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// JSON-path-like location, `$` being the document root.
    pub path: String,
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{schema} payload failed validation ({} issue(s))", issues.len())]
pub struct ValidationError {
    pub schema: String,
    pub issues: Vec<Issue>,
}

/// Semantic checks run after a payload deserialized successfully.
pub trait Validate {
    fn validate(&self, _issues: &mut Vec<Issue>) {}
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self, issues: &mut Vec<Issue>) {
        for item in self {
            item.validate(issues);
        }
    }
}

pub fn require_non_empty(issues: &mut Vec<Issue>, path: &str, value: &str) {
    if value.trim().is_empty() {
        issues.push(Issue::new(path, "must not be empty"));
    }
}

pub fn require_non_negative(issues: &mut Vec<Issue>, path: &str, value: i64) {
    if value < 0 {
        issues.push(Issue::new(path, format!("must not be negative, got {value}")));
    }
}

/// Deserialize and validate `data` as `T`.
pub fn parse_with_log<T>(data: &Value, schema_name: &str) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let parsed = match T::deserialize(data) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Err(log_failure(schema_name, vec![Issue::new("$", e.to_string())]));
        }
    };

    let mut issues = Vec::new();
    parsed.validate(&mut issues);

    if issues.is_empty() {
        Ok(parsed)
    } else {
        Err(log_failure(schema_name, issues))
    }
}

/// Same as [`parse_with_log`] for a raw body which may not even be JSON.
pub fn parse_bytes_with_log<T>(bytes: &[u8], schema_name: &str) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => parse_with_log(&value, schema_name),
        Err(e) => Err(log_failure(
            schema_name,
            vec![Issue::new("$", format!("invalid JSON: {e}"))],
        )),
    }
}

fn log_failure(schema_name: &str, issues: Vec<Issue>) -> ValidationError {
    warn!(
        schema = schema_name,
        issue_count = issues.len(),
        issues = ?issues,
        "🧾 ⚠️ Payload failed validation"
    );

    ValidationError {
        schema: schema_name.to_string(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Offer {
        id: String,
        cost: i64,
    }

    impl Validate for Offer {
        fn validate(&self, issues: &mut Vec<Issue>) {
            require_non_empty(issues, "$.id", &self.id);
            require_non_negative(issues, "$.cost", self.cost);
        }
    }

    #[derive(Debug, Deserialize)]
    struct Anything {}

    impl Validate for Anything {}

    #[test]
    fn valid_payload_is_returned() {
        let offer: Offer = parse_with_log(&json!({"id": "abc", "cost": 1775}), "Offer").unwrap();
        assert_eq!(offer.id, "abc");
        assert_eq!(offer.cost, 1775);
    }

    #[test]
    fn structural_failure_is_reported_at_root() {
        let err = parse_with_log::<Offer>(&json!({"id": 12}), "Offer").unwrap_err();

        assert_eq!(err.schema, "Offer");
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, "$");
    }

    #[test]
    fn semantic_failures_carry_their_paths() {
        let err = parse_with_log::<Offer>(&json!({"id": " ", "cost": -5}), "Offer").unwrap_err();

        let paths: Vec<_> = err.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["$.id", "$.cost"]);
    }

    #[test]
    fn malformed_inputs_never_panic() {
        let inputs = [
            json!(null),
            json!([]),
            json!("text"),
            json!(42),
            json!({"id": null, "cost": "free"}),
        ];

        for input in inputs {
            assert!(parse_with_log::<Offer>(&input, "Offer").is_err());
        }

        assert!(parse_with_log::<Anything>(&json!([1, 2]), "Anything").is_err());
    }

    #[test]
    fn non_json_bytes_are_rejected() {
        let err = parse_bytes_with_log::<Offer>(b"<html>502</html>", "Offer").unwrap_err();
        assert!(err.issues[0].message.starts_with("invalid JSON"));
    }
}
