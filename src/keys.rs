//! Key Builder
//!
//! Deterministic cache keys for lottery-retail data, plus the prefixes that
//! invalidate them.
//!
//! Keys follow `"{kind}:{granularity}:{scope}"`, for example
//! `sales:daily:2025-08-14` or `commissions:monthly:2025-08`. Hourly keys
//! extend the daily key (`sales:daily:2025-08-14:h09`) so that one daily
//! prefix covers both. The `*_prefixes` functions at the bottom of this module
//! are what [`CacheManager`](crate::manager::CacheManager) removes on a domain
//! event; any change to a key format must be mirrored there.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// == Data Kind ==
/// Category of operational data recorded at a retail point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Hourly sales figures
    Sales,
    /// Ticket counts
    Tickets,
    Commissions,
    /// Paid prizes
    Prizes,
    /// Roll changes
    Rolls,
}

impl DataKind {
    pub const ALL: [DataKind; 5] = [
        DataKind::Sales,
        DataKind::Tickets,
        DataKind::Commissions,
        DataKind::Prizes,
        DataKind::Rolls,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Sales => "sales",
            DataKind::Tickets => "tickets",
            DataKind::Commissions => "commissions",
            DataKind::Prizes => "prizes",
            DataKind::Rolls => "rolls",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CacheError::InvalidRequest(format!("unknown data kind '{}'", s)))
    }
}

// == Comparison Mode ==
/// Period granularity of a comparison report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    Day,
    Week,
    Month,
    Year,
}

impl ComparisonMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonMode::Day => "day",
            ComparisonMode::Week => "week",
            ComparisonMode::Month => "month",
            ComparisonMode::Year => "year",
        }
    }
}

// == Keys ==

/// Daily total: `sales:daily:2025-08-14`
pub fn daily(kind: DataKind, date: NaiveDate) -> String {
    format!("{}:daily:{}", kind, date.format("%Y-%m-%d"))
}

/// One hour of a day: `sales:daily:2025-08-14:h09`
pub fn hourly(kind: DataKind, date: NaiveDate, hour: u32) -> String {
    format!("{}:h{:02}", daily(kind, date), hour)
}

/// Monthly total: `sales:monthly:2025-08`
pub fn monthly(kind: DataKind, year: i32, month: u32) -> String {
    format!("{}:monthly:{}", kind, year_month(year, month))
}

/// ISO week containing `date`: `sales:weekly:2025-W33`
pub fn weekly(kind: DataKind, date: NaiveDate) -> String {
    format!("{}:weekly:{}", kind, iso_week(date))
}

/// Arbitrary inclusive range: `sales:range:2025-08-01:2025-08-31`
pub fn range(kind: DataKind, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{}:range:{}:{}",
        kind,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

/// Comparison result: `sales:comparison:2025-08-01:2025-08-07:week`
pub fn comparison(kind: DataKind, start: NaiveDate, end: NaiveDate, mode: ComparisonMode) -> String {
    format!(
        "{}:comparison:{}:{}:{}",
        kind,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
        mode.as_str()
    )
}

pub fn user_profile(user_id: &str) -> String {
    format!("{}profile", user_prefix(user_id))
}

pub fn user_permissions(user_id: &str) -> String {
    format!("{}permissions", user_prefix(user_id))
}

pub fn dashboard_summary(date: NaiveDate) -> String {
    format!("dashboard:summary:{}", date.format("%Y-%m-%d"))
}

pub fn dashboard_monthly(year: i32, month: u32) -> String {
    format!("dashboard:monthly:{}", year_month(year, month))
}

// == Invalidation Prefixes ==

/// Every key of one data kind.
pub fn kind_prefix(kind: DataKind) -> String {
    format!("{}:", kind)
}

/// Every key of one user. The trailing colon keeps `user:1:` from matching `user:12:`.
pub fn user_prefix(user_id: &str) -> String {
    format!("user:{}:", user_id)
}

/// Keys affected when data of `kind` changes on `date`.
///
/// Covers the day and its hours, its month, its ISO week, and every range
/// and comparison of that kind (those may span the date).
pub fn date_prefixes(kind: DataKind, date: NaiveDate) -> Vec<String> {
    vec![
        daily(kind, date),
        monthly(kind, date.year(), date.month()),
        weekly(kind, date),
        format!("{}:range:", kind),
        format!("{}:comparison:", kind),
    ]
}

/// Keys affected when data of `kind` changes somewhere in a month.
///
/// Weeks can straddle months, so all weekly keys of the kind go.
pub fn month_prefixes(kind: DataKind, year: i32, month: u32) -> Vec<String> {
    vec![
        format!("{}:daily:{}", kind, year_month(year, month)),
        monthly(kind, year, month),
        format!("{}:weekly:", kind),
        format!("{}:range:", kind),
        format!("{}:comparison:", kind),
    ]
}

fn year_month(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

fn iso_week(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_key_formats() {
        let date = d(2025, 8, 14);
        assert_eq!(daily(DataKind::Sales, date), "sales:daily:2025-08-14");
        assert_eq!(hourly(DataKind::Tickets, date, 9), "tickets:daily:2025-08-14:h09");
        assert_eq!(monthly(DataKind::Commissions, 2025, 8), "commissions:monthly:2025-08");
        assert_eq!(weekly(DataKind::Prizes, date), "prizes:weekly:2025-W33");
        assert_eq!(
            range(DataKind::Rolls, d(2025, 8, 1), d(2025, 8, 31)),
            "rolls:range:2025-08-01:2025-08-31"
        );
        assert_eq!(
            comparison(DataKind::Sales, d(2025, 8, 1), d(2025, 8, 7), ComparisonMode::Week),
            "sales:comparison:2025-08-01:2025-08-07:week"
        );
        assert_eq!(user_profile("42"), "user:42:profile");
        assert_eq!(user_permissions("42"), "user:42:permissions");
        assert_eq!(dashboard_summary(date), "dashboard:summary:2025-08-14");
        assert_eq!(dashboard_monthly(2025, 8), "dashboard:monthly:2025-08");
    }

    #[test]
    fn test_keys_are_deterministic() {
        let date = d(2024, 2, 29);
        assert_eq!(daily(DataKind::Sales, date), daily(DataKind::Sales, date));
        assert_ne!(daily(DataKind::Sales, date), daily(DataKind::Tickets, date));
    }

    #[test]
    fn test_iso_week_across_year_boundary() {
        // 2024-12-30 belongs to ISO week 1 of 2025
        assert_eq!(weekly(DataKind::Sales, d(2024, 12, 30)), "sales:weekly:2025-W01");
    }

    #[test]
    fn test_date_prefixes_cover_derived_keys() {
        let date = d(2025, 8, 14);
        let prefixes = date_prefixes(DataKind::Sales, date);
        let covered = |key: &str| prefixes.iter().any(|p| key.starts_with(p.as_str()));

        assert!(covered(&daily(DataKind::Sales, date)));
        assert!(covered(&hourly(DataKind::Sales, date, 23)));
        assert!(covered(&monthly(DataKind::Sales, 2025, 8)));
        assert!(covered(&weekly(DataKind::Sales, date)));
        assert!(covered(&range(DataKind::Sales, d(2025, 8, 1), d(2025, 8, 31))));

        assert!(!covered(&daily(DataKind::Sales, d(2025, 8, 15))));
        assert!(!covered(&monthly(DataKind::Sales, 2025, 7)));
        assert!(!covered(&daily(DataKind::Tickets, date)));
    }

    #[test]
    fn test_month_prefixes_cover_every_day() {
        let prefixes = month_prefixes(DataKind::Prizes, 2025, 2);
        let covered = |key: &str| prefixes.iter().any(|p| key.starts_with(p.as_str()));

        assert!(covered(&daily(DataKind::Prizes, d(2025, 2, 1))));
        assert!(covered(&hourly(DataKind::Prizes, d(2025, 2, 28), 5)));
        assert!(covered(&monthly(DataKind::Prizes, 2025, 2)));
        assert!(!covered(&daily(DataKind::Prizes, d(2025, 3, 1))));
    }

    #[test]
    fn test_user_prefix_does_not_bleed() {
        assert!(user_profile("1").starts_with(&user_prefix("1")));
        assert!(!user_profile("12").starts_with(&user_prefix("1")));
    }

    #[test]
    fn test_data_kind_parse() {
        assert_eq!("prizes".parse::<DataKind>().unwrap(), DataKind::Prizes);
        assert!("bingo".parse::<DataKind>().is_err());
    }
}
