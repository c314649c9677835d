//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::error::{CacheError, Result};
use crate::keys::DataKind;
use crate::manager::{DateScope, DomainEvent};

/// Request body for `POST /invalidate`
///
/// # Fields
/// - `domain`: a data kind (`sales`, `tickets`, `commissions`, `prizes`,
///   `rolls`), `user-profile` (same spelling as the namespace), or `all`
/// - `date`: optional `YYYY-MM-DD` narrowing a data event
/// - `month`: optional `YYYY-MM` narrowing a data event
/// - `user_id`: required for `user-profile`
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub domain: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl InvalidateRequest {
    /// Validates the request and converts it into a domain event.
    pub fn to_event(&self) -> Result<DomainEvent> {
        match self.domain.as_str() {
            "all" => Ok(DomainEvent::Everything),
            "user-profile" => match self.user_id.as_deref() {
                Some(id) if !id.trim().is_empty() => Ok(DomainEvent::user(id)),
                _ => Err(CacheError::InvalidRequest(
                    "user-profile invalidation requires a user_id".to_string(),
                )),
            },
            other => {
                let kind: DataKind = other.parse()?;
                let scope = match (&self.date, &self.month) {
                    (Some(_), Some(_)) => {
                        return Err(CacheError::InvalidRequest(
                            "give either date or month, not both".to_string(),
                        ))
                    }
                    (Some(date), None) => DateScope::Date(parse_date(date)?),
                    (None, Some(month)) => {
                        let first = parse_date(&format!("{}-01", month))?;
                        DateScope::Month {
                            year: first.year(),
                            month: first.month(),
                        }
                    }
                    (None, None) => DateScope::All,
                };
                Ok(DomainEvent::DataChanged { kind, scope })
            }
        }
    }
}

/// Request body for `POST /namespaces/:name/invalidate`
#[derive(Debug, Clone, Deserialize)]
pub struct PatternRequest {
    /// Regular expression matched against keys
    pub pattern: String,
}

impl PatternRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        None
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| CacheError::InvalidRequest(format!("invalid date '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> InvalidateRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_date_event() {
        let event = request(r#"{"domain": "sales", "date": "2025-08-14"}"#)
            .to_event()
            .unwrap();
        assert_eq!(
            event,
            DomainEvent::on_date(DataKind::Sales, NaiveDate::from_ymd_opt(2025, 8, 14).unwrap())
        );
    }

    #[test]
    fn test_month_event() {
        let event = request(r#"{"domain": "prizes", "month": "2025-02"}"#)
            .to_event()
            .unwrap();
        assert_eq!(event, DomainEvent::in_month(DataKind::Prizes, 2025, 2));
    }

    #[test]
    fn test_unscoped_and_global_events() {
        assert_eq!(
            request(r#"{"domain": "rolls"}"#).to_event().unwrap(),
            DomainEvent::any_date(DataKind::Rolls)
        );
        assert_eq!(
            request(r#"{"domain": "all"}"#).to_event().unwrap(),
            DomainEvent::Everything
        );
        assert_eq!(
            request(r#"{"domain": "user-profile", "user_id": "9"}"#).to_event().unwrap(),
            DomainEvent::user("9")
        );
    }

    #[test]
    fn test_rejects_bad_requests() {
        for body in [
            r#"{"domain": "lotto"}"#,
            r#"{"domain": "sales", "date": "14/08/2025"}"#,
            r#"{"domain": "sales", "month": "2025-13"}"#,
            r#"{"domain": "sales", "date": "2025-08-14", "month": "2025-08"}"#,
            r#"{"domain": "user-profile"}"#,
            r#"{"domain": "user_profile", "user_id": "9"}"#,
        ] {
            assert!(
                matches!(request(body).to_event(), Err(CacheError::InvalidRequest(_))),
                "{} should be rejected",
                body
            );
        }
    }

    #[test]
    fn test_pattern_validate() {
        assert!(PatternRequest { pattern: String::new() }.validate().is_some());
        assert!(PatternRequest { pattern: "^sales:".to_string() }.validate().is_none());
    }
}
