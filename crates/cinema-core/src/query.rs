use chrono::NaiveDate;
use cinema_models::Month;
use crate::error::{Result, ServiceError};

/// `YYYY-MM`, checked before anything is fetched
pub fn parse_month(raw: &str) -> Result<Month> {
    raw.parse::<Month>()
        .map_err(|_| ServiceError::InvalidQuery(format!("'{}' is not a month (expected YYYY-MM)", raw)))
}

/// `YYYY-MM-DD`, checked before anything is fetched
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.len() != 10 {
        return Err(invalid_date(raw));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid_date(raw))
}

fn invalid_date(raw: &str) -> ServiceError {
    ServiceError::InvalidQuery(format!("'{}' is not a date (expected YYYY-MM-DD)", raw))
}
