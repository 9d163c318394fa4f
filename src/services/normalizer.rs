// src/services/normalizer.rs
use chrono::NaiveDate;
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

pub const CNPJ_LEN: usize = 14;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%Y%m%d"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Invalid fund identifier '{0}': no digits found")]
    Identifier(String),

    #[error("Invalid start date '{0}'")]
    StartDate(String),

    #[error("Invalid end date '{0}'")]
    EndDate(String),
}

fn non_digits() -> &'static Regex {
    static NON_DIGITS: OnceLock<Regex> = OnceLock::new();
    // ASCII class on purpose: \D would keep non-latin digits
    NON_DIGITS.get_or_init(|| Regex::new(r"[^0-9]").expect("static pattern"))
}

/// Strips everything but ASCII digits and left-pads with zeros to 14 characters.
///
/// No checksum is applied, any digit string is accepted. Extra digits past
/// the fourteenth are dropped so the result is always a 14-digit code.
pub fn normalize_identifier(raw: &str) -> String {
    let digits = non_digits().replace_all(raw, "");
    let digits: String = digits.chars().take(CNPJ_LEN).collect();
    format!("{:0>width$}", digits, width = CNPJ_LEN)
}

/// Parses a calendar date and returns it as `YYYYMMDD`, or `None` if it is not one.
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())?;

    let compact = date.format("%Y%m%d").to_string();
    if compact.len() == 8 && compact.bytes().all(|b| b.is_ascii_digit()) {
        Some(compact)
    } else {
        debug!("Date '{}' does not fit the 8-digit form", trimmed);
        None
    }
}

/// A validated request for one fund over one date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundQuery {
    cnpj: String,
    start: String,
    end: String,
}

impl FundQuery {
    pub fn new(raw_id: &str, raw_start: &str, raw_end: &str) -> Result<Self, InputError> {
        if !raw_id.bytes().any(|b| b.is_ascii_digit()) {
            return Err(InputError::Identifier(raw_id.to_string()));
        }
        let cnpj = normalize_identifier(raw_id);
        let start = normalize_date(raw_start).ok_or_else(|| InputError::StartDate(raw_start.to_string()))?;
        let end = normalize_date(raw_end).ok_or_else(|| InputError::EndDate(raw_end.to_string()))?;

        debug!("Normalized query: cnpj={} start={} end={}", cnpj, start, end);
        Ok(FundQuery { cnpj, start, end })
    }

    pub fn cnpj(&self) -> &str {
        &self.cnpj
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_with_punctuation_is_cleaned() {
        assert_eq!(normalize_identifier("10.500.884/0001-05"), "10500884000105");
    }

    #[test]
    fn short_identifier_is_zero_padded() {
        assert_eq!(normalize_identifier("123"), "00000000000123");
        assert_eq!(normalize_identifier(""), "00000000000000");
    }

    #[test]
    fn identifier_is_always_fourteen_ascii_digits() {
        let inputs = [
            "",
            "abc",
            "1",
            "12.345.678/0001-90",
            "  99 88 77  ",
            "123456789012345678",
            "٣٤٥ 12",
            "cnpj: 00.000.000/0000-00",
        ];
        for input in inputs {
            let out = normalize_identifier(input);
            assert_eq!(out.len(), CNPJ_LEN, "input {:?}", input);
            assert!(out.bytes().all(|b| b.is_ascii_digit()), "input {:?} -> {:?}", input, out);
        }
    }

    #[test]
    fn overlong_identifier_keeps_leading_digits() {
        assert_eq!(normalize_identifier("123456789012345678"), "12345678901234");
    }

    #[test]
    fn dates_in_accepted_forms_are_compacted() {
        assert_eq!(normalize_date("1900-01-01").as_deref(), Some("19000101"));
        assert_eq!(normalize_date("2024/02/29").as_deref(), Some("20240229"));
        assert_eq!(normalize_date("31/12/2023").as_deref(), Some("20231231"));
        assert_eq!(normalize_date("20230615").as_deref(), Some("20230615"));
        assert_eq!(normalize_date("  2023-06-15 ").as_deref(), Some("20230615"));
    }

    #[test]
    fn non_dates_return_none() {
        assert_eq!(normalize_date("not-a-date"), None);
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("2023-02-30"), None);
        assert_eq!(normalize_date("2023-13-01"), None);
    }

    #[test]
    fn query_rejects_identifier_without_digits() {
        let err = FundQuery::new("abc", "2020-01-01", "2020-12-31").unwrap_err();
        assert_eq!(err, InputError::Identifier("abc".to_string()));
    }

    #[test]
    fn query_rejects_bad_dates() {
        let err = FundQuery::new("123", "not-a-date", "2020-12-31").unwrap_err();
        assert!(matches!(err, InputError::StartDate(_)));

        let err = FundQuery::new("123", "2020-01-01", "").unwrap_err();
        assert!(matches!(err, InputError::EndDate(_)));
    }

    #[test]
    fn query_holds_normalized_fields() {
        let query = FundQuery::new("10.500.884/0001-05", "1900-01-01", "2024-03-15").unwrap();
        assert_eq!(query.cnpj(), "10500884000105");
        assert_eq!(query.start(), "19000101");
        assert_eq!(query.end(), "20240315");
    }
}
