//! Date helper functions

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, FixedOffset, Locale, NaiveDate, TimeZone, Utc};
use std::fmt;
use serde::{Deserialize, Serialize};

/// Locales with date formatting support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLocale {
    PtBr,
    EnUs,
}

/// Localized date length, mirroring the `P`..`PPPP` long-format tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `05/01/2023`
    Short,
    /// `5 jan 2023`
    #[default]
    Medium,
    /// `5 de janeiro de 2023`
    Long,
    /// `quinta-feira, 5 de janeiro de 2023`
    Full,
}

/// date-fns weekday names; chrono's pt_BR data has the short forms (`quinta`)
const PT_WEEKDAYS: [&str; 7] = [
    "domingo",
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
];

impl DateLocale {
    /// Resolve a language tag like `pt-BR` or `en_US`; unknown tags use pt-BR
    pub fn from_tag(tag: &str) -> Self {
        let lang = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match lang.as_str() {
            "en" => DateLocale::EnUs,
            _ => DateLocale::PtBr,
        }
    }
}

/// Format a date in the given locale and style
pub fn format_date<Tz>(date: &DateTime<Tz>, locale: DateLocale, style: DateStyle) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let pt = |format: &str| date.format_localized(format, Locale::pt_BR).to_string();

    match (locale, style) {
        (DateLocale::PtBr, DateStyle::Short) => pt("%d/%m/%Y"),
        (DateLocale::PtBr, DateStyle::Medium) => pt("%-d %b %Y"),
        (DateLocale::PtBr, DateStyle::Long) => pt("%-d de %B de %Y"),
        (DateLocale::PtBr, DateStyle::Full) => {
            let weekday = date.weekday().num_days_from_sunday() as usize;
            format!("{}, {}", PT_WEEKDAYS[weekday], pt("%-d de %B de %Y"))
        }
        (DateLocale::EnUs, DateStyle::Short) => date.format("%m/%d/%Y").to_string(),
        (DateLocale::EnUs, DateStyle::Medium) => date.format("%b %-d, %Y").to_string(),
        (DateLocale::EnUs, DateStyle::Long) => {
            format!("{} {}, {}", date.format("%B"), ordinal(date.day()), date.year())
        }
        (DateLocale::EnUs, DateStyle::Full) => format!(
            "{} {}, {}",
            date.format("%A, %B"),
            ordinal(date.day()),
            date.year()
        ),
    }
}

/// English ordinal day (1st, 2nd, 11th, 22nd)
fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}

/// Parse an ISO 8601 timestamp as returned by the CMS
///
/// Accepts RFC 3339 (`2023-01-05T00:00:00Z`), offsets without a colon
/// (`2021-03-25T19:25:28+0000`) and bare dates, which are taken as UTC midnight.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("Invalid time value: {}", raw))?;
        return Ok(Utc.from_utc_datetime(&midnight).fixed_offset());
    }
    Err(anyhow!("Invalid time value: {}", raw))
}

/// Reformat a publication timestamp into its display string
///
/// A missing timestamp stays missing; the raw value is not kept.
pub fn format_publication_date<Tz>(
    raw: Option<&str>,
    tz: &Tz,
    locale: DateLocale,
    style: DateStyle,
) -> Result<Option<String>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let Some(raw) = raw else {
        return Ok(None);
    };
    let local = parse_timestamp(raw)?.with_timezone(tz);
    Ok(Some(format_date(&local, locale, style)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pt_br_medium_is_pinned() {
        let formatted = format_publication_date(
            Some("2023-01-05T00:00:00Z"),
            &chrono_tz::UTC,
            DateLocale::PtBr,
            DateStyle::Medium,
        )
        .unwrap();
        assert_eq!(formatted.as_deref(), Some("5 jan 2023"));
    }

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_pt_br_styles() {
        let date = utc(2023, 1, 5);
        assert_eq!(format_date(&date, DateLocale::PtBr, DateStyle::Short), "05/01/2023");
        assert_eq!(
            format_date(&date, DateLocale::PtBr, DateStyle::Long),
            "5 de janeiro de 2023"
        );
        assert_eq!(
            format_date(&date, DateLocale::PtBr, DateStyle::Full),
            "quinta-feira, 5 de janeiro de 2023"
        );
        let date = utc(2024, 3, 10);
        assert_eq!(format_date(&date, DateLocale::PtBr, DateStyle::Medium), "10 mar 2024");
        assert_eq!(
            format_date(&date, DateLocale::PtBr, DateStyle::Full),
            "domingo, 10 de março de 2024"
        );
    }

    #[test]
    fn test_en_us_styles() {
        let date = utc(2023, 1, 5);
        assert_eq!(format_date(&date, DateLocale::EnUs, DateStyle::Short), "01/05/2023");
        assert_eq!(format_date(&date, DateLocale::EnUs, DateStyle::Medium), "Jan 5, 2023");
        assert_eq!(
            format_date(&date, DateLocale::EnUs, DateStyle::Full),
            "Thursday, January 5th, 2023"
        );
        let date = utc(2023, 3, 12);
        assert_eq!(
            format_date(&date, DateLocale::EnUs, DateStyle::Long),
            "March 12th, 2023"
        );
    }

    #[test]
    fn test_display_timezone_shifts_day() {
        let formatted = format_publication_date(
            Some("2023-01-05T00:00:00Z"),
            &chrono_tz::America::Sao_Paulo,
            DateLocale::PtBr,
            DateStyle::Medium,
        )
        .unwrap();
        assert_eq!(formatted.as_deref(), Some("4 jan 2023"));
    }

    #[test]
    fn test_cms_offset_without_colon() {
        let dt = parse_timestamp("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(format_date(&dt, DateLocale::PtBr, DateStyle::Medium), "25 mar 2021");
    }

    #[test]
    fn test_missing_and_invalid_dates() {
        let none =
            format_publication_date(None, &chrono_tz::UTC, DateLocale::PtBr, DateStyle::Medium);
        assert_eq!(none.unwrap(), None);

        let invalid = format_publication_date(
            Some("yesterday"),
            &chrono_tz::UTC,
            DateLocale::PtBr,
            DateStyle::Medium,
        );
        assert!(invalid.is_err());
    }

    #[test]
    fn test_locale_from_tag() {
        assert_eq!(DateLocale::from_tag("pt-BR"), DateLocale::PtBr);
        assert_eq!(DateLocale::from_tag("en_US"), DateLocale::EnUs);
        assert_eq!(DateLocale::from_tag("fr"), DateLocale::PtBr);
    }
}
