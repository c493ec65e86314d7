//! Date helper functions

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Display locale for month and weekday names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    PtBr,
    En,
}

const PT_MONTHS: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];
const PT_MONTHS_SHORT: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];
const PT_WEEKDAYS: [&str; 7] = [
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
    "domingo",
];
const PT_WEEKDAYS_SHORT: [&str; 7] = ["seg", "ter", "qua", "qui", "sex", "sáb", "dom"];

impl Locale {
    /// Parse a language tag such as `pt-BR` or `en-US`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lang = tag
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match lang.as_str() {
            "pt" => Some(Locale::PtBr),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    /// Canonical tag, also used to pick UI strings
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::PtBr => "pt-BR",
            Locale::En => "en",
        }
    }
}

/// Moment.js-style tokens, longest first so `MMMM` wins over `MM`
const TOKENS: [&str; 17] = [
    "YYYY", "YY", "MMMM", "MMM", "MM", "M", "DDDD", "DD", "D", "dddd", "ddd", "HH", "hh", "mm",
    "ss", "SSS", "ZZ",
];

/// Format a date using a Moment.js-compatible format string
///
/// Text inside `[...]` is copied literally.
///
/// # Examples
/// ```ignore
/// format_date(&date, "DD MMM YYYY", Locale::PtBr) // -> "15 mar 2021"
/// ```
pub fn format_date<Z: TimeZone>(date: &DateTime<Z>, format: &str, locale: Locale) -> String
where
    Z::Offset: std::fmt::Display,
{
    let mut out = String::with_capacity(format.len() + 8);
    let mut rest = format;

    while let Some(ch) = rest.chars().next() {
        if ch == '[' {
            if let Some(end) = rest.find(']') {
                out.push_str(&rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }

        match TOKENS.iter().find(|t| rest.starts_with(**t)) {
            Some(token) => {
                out.push_str(&render_token(date, token, locale));
                rest = &rest[token.len()..];
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    out
}

fn render_token<Z: TimeZone>(date: &DateTime<Z>, token: &str, locale: Locale) -> String
where
    Z::Offset: std::fmt::Display,
{
    let month = date.month0() as usize;
    let weekday = date.weekday().num_days_from_monday() as usize;

    match (token, locale) {
        ("YYYY", _) => format!("{:04}", date.year()),
        ("YY", _) => format!("{:02}", date.year().rem_euclid(100)),
        ("MMMM", Locale::PtBr) => PT_MONTHS[month].to_string(),
        ("MMMM", Locale::En) => date.format("%B").to_string(),
        ("MMM", Locale::PtBr) => PT_MONTHS_SHORT[month].to_string(),
        ("MMM", Locale::En) => date.format("%b").to_string(),
        ("MM", _) => format!("{:02}", date.month()),
        ("M", _) => date.month().to_string(),
        ("DDDD", _) => format!("{:03}", date.ordinal()),
        ("DD", _) => format!("{:02}", date.day()),
        ("D", _) => date.day().to_string(),
        ("dddd", Locale::PtBr) => PT_WEEKDAYS[weekday].to_string(),
        ("dddd", Locale::En) => date.format("%A").to_string(),
        ("ddd", Locale::PtBr) => PT_WEEKDAYS_SHORT[weekday].to_string(),
        ("ddd", Locale::En) => date.format("%a").to_string(),
        ("HH", _) => format!("{:02}", date.hour()),
        ("hh", _) => date.format("%I").to_string(),
        ("mm", _) => format!("{:02}", date.minute()),
        ("ss", _) => format!("{:02}", date.second()),
        ("SSS", _) => date.format("%3f").to_string(),
        ("ZZ", _) => date.format("%z").to_string(),
        (other, _) => other.to_string(),
    }
}

/// Parse an API timestamp
///
/// Accepts RFC 3339, the `+0000` offset form the content API emits, and a
/// bare `YYYY-MM-DD` (taken as midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Formats publication dates for display in the site's zone and locale
#[derive(Debug, Clone)]
pub struct DateFormatter {
    format: String,
    locale: Locale,
    timezone: Tz,
}

impl DateFormatter {
    pub fn new(format: &str, locale: Locale, timezone: Tz) -> Self {
        Self {
            format: format.to_string(),
            locale,
            timezone,
        }
    }

    /// Format a UTC instant after shifting it into the display zone
    pub fn format(&self, date: &DateTime<Utc>) -> String {
        format_date(
            &date.with_timezone(&self.timezone),
            &self.format,
            self.locale,
        )
    }

    /// Format an optional date; unpublished documents render as empty text
    pub fn format_opt(&self, date: Option<&DateTime<Utc>>) -> String {
        date.map(|d| self.format(d)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_pt_br() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(format_date(&date, "DD MMM YYYY", Locale::PtBr), "15 mar 2021");
        assert_eq!(
            format_date(&date, "dddd, D [de] MMMM [de] YYYY", Locale::PtBr),
            "segunda-feira, 15 de março de 2021"
        );
    }

    #[test]
    fn test_format_date_en() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 10, 30, 5).unwrap();
        assert_eq!(format_date(&date, "DD MMM YYYY", Locale::En), "15 Mar 2021");
        assert_eq!(format_date(&date, "YYYY-MM-DD HH:mm:ss", Locale::En), "2021-03-15 10:30:05");
    }

    #[test]
    fn test_single_digit_day_padding() {
        let date = Utc.with_ymd_and_hms(2021, 8, 5, 0, 0, 0).unwrap();
        assert_eq!(format_date(&date, "DD MMM YYYY", Locale::PtBr), "05 ago 2021");
        assert_eq!(format_date(&date, "D/M/YY", Locale::PtBr), "5/8/21");
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        assert_eq!(parse_timestamp("2021-03-15T19:25:28+0000"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-15T19:25:28Z"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-15T16:25:28-03:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2021-03-15"),
            Some(Utc.with_ymd_and_hms(2021, 3, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_formatter_shifts_timezone() {
        let formatter = DateFormatter::new("DD MMM YYYY", Locale::PtBr, chrono_tz::America::Sao_Paulo);
        // 01:00 UTC is still the previous day in São Paulo
        let date = Utc.with_ymd_and_hms(2021, 3, 16, 1, 0, 0).unwrap();
        assert_eq!(formatter.format(&date), "15 mar 2021");

        let utc = DateFormatter::new("DD MMM YYYY", Locale::PtBr, chrono_tz::UTC);
        assert_eq!(utc.format(&date), "16 mar 2021");
        assert_eq!(utc.format_opt(None), "");
    }

    #[test]
    fn test_locale_from_tag() {
        assert_eq!(Locale::from_tag("pt-BR"), Some(Locale::PtBr));
        assert_eq!(Locale::from_tag("pt_br"), Some(Locale::PtBr));
        assert_eq!(Locale::from_tag("en-US"), Some(Locale::En));
        assert_eq!(Locale::from_tag("fr"), None);
    }
}
