use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::process::raw_table::RawValue;
use crate::process::utils::clean_str;

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})[-/](\d{1,2})(?:[-/](\d{1,2}))?(?:[ T].*)?$")
        .expect("date regex should compile")
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("year regex should compile"));

/// Parse `"YYYY-MM"`, `"YYYY/MM"`, `"YYYY-MM-DD"` or `"YYYY/MM/DD"` (an
/// optional trailing time part is ignored). A missing day means the 1st.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = clean_str(s);
    let caps = DATE_RE.captures(&s)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = match caps.get(3) {
        Some(d) => d.as_str().parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a transaction month, normalized to the first day of that month.
pub fn parse_month(s: &str) -> Option<NaiveDate> {
    parse_date(s).and_then(|d| d.with_day(1))
}

/// Parse a lease commencement value: a bare year (`1985`, `"1985"`) is
/// read as 1 January of that year; anything else goes through [`parse_date`].
pub fn parse_year_date(v: &RawValue) -> Option<NaiveDate> {
    match v {
        RawValue::Number(n) if n.fract() == 0.0 && (1.0..=9999.0).contains(n) => {
            NaiveDate::from_ymd_opt(*n as i32, 1, 1)
        }
        RawValue::Number(_) | RawValue::Other(_) => None,
        RawValue::Text(s) => {
            let s = clean_str(s);
            if YEAR_RE.is_match(&s) {
                NaiveDate::from_ymd_opt(s.parse().ok()?, 1, 1)
            } else {
                parse_date(&s)
            }
        }
    }
}

/// Days since the Unix epoch, the Arrow `Date32` representation.
pub fn to_date32(d: NaiveDate) -> i32 {
    (d - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()).num_days() as i32
}

pub fn from_date32(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().checked_add_signed(chrono::Duration::days(days as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_month_forms() {
        assert_eq!(parse_month("2023-01"), Some(ymd(2023, 1, 1)));
        assert_eq!(parse_month("2023/1"), Some(ymd(2023, 1, 1)));
        assert_eq!(parse_month("2023-01-15"), Some(ymd(2023, 1, 1)));
        assert_eq!(parse_month("2023-01-15T00:00:00"), Some(ymd(2023, 1, 1)));
        assert_eq!(parse_month(" \"2023-02\" "), Some(ymd(2023, 2, 1)));
    }

    #[test]
    fn test_parse_month_rejects() {
        assert_eq!(parse_month("not a month"), None);
        assert_eq!(parse_month("2023-13"), None);
        assert_eq!(parse_month("2023-02-30"), None);
        assert_eq!(parse_month(""), None);
    }

    #[test]
    fn test_parse_year_date() {
        assert_eq!(parse_year_date(&RawValue::from(1985.0)), Some(ymd(1985, 1, 1)));
        assert_eq!(parse_year_date(&RawValue::from("1990")), Some(ymd(1990, 1, 1)));
        assert_eq!(parse_year_date(&RawValue::from("1990-06-01")), Some(ymd(1990, 6, 1)));
        assert_eq!(parse_year_date(&RawValue::from(1985.5)), None);
        assert_eq!(parse_year_date(&RawValue::from("unknown")), None);
    }

    #[test]
    fn test_date32_conversion() {
        let d = ymd(2023, 1, 1);
        assert_eq!(from_date32(to_date32(d)), Some(d));
        assert_eq!(to_date32(ymd(1970, 1, 2)), 1);
    }
}
