//! Locale-aware captions and date formatting.
//!
//! Two locales are supported, English and German. Dates are rendered in one of two styles:
//! - short: `4/21/21` (en) / `21.04.21` (de)
//! - medium: `Apr 21, 2021` (en) / `21.04.2021` (de)
//!
//! Calendar dates (`YYYY-MM-DD`) are pure dates and are never shifted between time zones.
//! Timestamps are converted to the configured display offset before formatting.

use crate::CoreError;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use std::str::FromStr;

/// Display language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Locale {
    #[default]
    En,
    De,
}

impl Locale {
    pub fn captions(&self) -> &'static Captions {
        match self {
            Locale::En => &EN,
            Locale::De => &DE,
        }
    }
}

impl FromStr for Locale {
    type Err = CoreError;

    /// Accepts a language tag with an optional region, e.g. `de`, `de-DE`, `en_GB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let language = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match language.as_str() {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            _ => Err(CoreError::InvalidInput(format!("unsupported locale: {s}"))),
        }
    }
}

/// Everything the derivation needs to know about how to present text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayContext {
    pub locale: Locale,
    /// Offset timestamps are converted to before display.
    pub utc_offset: FixedOffset,
}

impl DisplayContext {
    pub fn new(locale: Locale, utc_offset: FixedOffset) -> Self {
        Self { locale, utc_offset }
    }

    pub fn captions(&self) -> &'static Captions {
        self.locale.captions()
    }

    pub fn short_date(&self, date: NaiveDate) -> String {
        match self.locale {
            Locale::En => date.format("%-m/%-d/%y").to_string(),
            Locale::De => date.format("%d.%m.%y").to_string(),
        }
    }

    pub fn medium_date(&self, date: NaiveDate) -> String {
        match self.locale {
            Locale::En => date.format("%b %-d, %Y").to_string(),
            Locale::De => date.format("%d.%m.%Y").to_string(),
        }
    }

    /// Short date followed by short time, in the display offset.
    pub fn short_date_time(&self, timestamp: DateTime<FixedOffset>) -> String {
        let local = timestamp.with_timezone(&self.utc_offset);
        let date = self.short_date(local.date_naive());
        let time = match self.locale {
            Locale::En => local.format("%-I:%M %p").to_string(),
            Locale::De => local.format("%H:%M").to_string(),
        };
        format!("{date}, {time}")
    }
}

impl Default for DisplayContext {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            utc_offset: utc(),
        }
    }
}

pub(crate) fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse an ISO calendar date in exactly the `YYYY-MM-DD` form.
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let bytes = input.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    // chrono alone tolerates signed years and padding spaces
    let digits_only = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_only {
        return None;
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

/// Parse an RFC 3339 timestamp, e.g. `2021-05-29T22:34:17.595Z`.
pub fn parse_timestamp(input: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(input.trim()).ok()
}

/// Substitute `{name}` in `template` with `value`.
pub(crate) fn fill(template: &str, name: &str, value: &str) -> String {
    template.replace(&format!("{{{name}}}"), value)
}

/// Fixed caption strings for one locale.
#[derive(Debug)]
pub struct Captions {
    pub person_title: &'static str,
    pub person_subtitle: &'static str,
    pub vaccination_headline: &'static str,
    pub test_headline: &'static str,
    pub recovery_headline: &'static str,
    pub pcr_test: &'static str,
    pub antigen_test: &'static str,
    /// `{dose}` and `{total}`
    pub vaccination_count: &'static str,
    /// `{date}`
    pub vaccination_date: &'static str,
    /// `{date}`
    pub sample_collection_date: &'static str,
    /// `{date}`
    pub validity_date: &'static str,
    /// `{days}`
    pub days_until_complete_protection: &'static str,
    /// `{date}`
    pub date_of_birth: &'static str,
    pub qr_code_image_description: &'static str,
}

static EN: Captions = Captions {
    person_title: "Digital Vaccination Certificate",
    person_subtitle: "COVID-19 Vaccination",
    vaccination_headline: "Vaccination Certificate",
    test_headline: "Test Certificate",
    recovery_headline: "Certificate of Recovery",
    pcr_test: "PCR Test",
    antigen_test: "Rapid Antigen Test",
    vaccination_count: "{dose} of {total}",
    vaccination_date: "Vaccinated on {date}",
    sample_collection_date: "Sample taken on {date}",
    validity_date: "Valid until {date}",
    days_until_complete_protection: "You will have full vaccination protection in {days} days.",
    date_of_birth: "born {date}",
    qr_code_image_description: "QR code of the certificate currently in use",
};

static DE: Captions = Captions {
    person_title: "Digitaler Impfnachweis",
    person_subtitle: "COVID-19-Impfung",
    vaccination_headline: "Impfzertifikat",
    test_headline: "Testzertifikat",
    recovery_headline: "Genesenenzertifikat",
    pcr_test: "PCR-Test",
    antigen_test: "Schnelltest",
    vaccination_count: "{dose} von {total}",
    vaccination_date: "Geimpft am {date}",
    sample_collection_date: "Probenahme am {date}",
    validity_date: "Gültig bis {date}",
    days_until_complete_protection: "Sie haben in {days} Tagen vollständigen Impfschutz.",
    date_of_birth: "geboren {date}",
    qr_code_image_description: "QR-Code des aktuell verwendeten Zertifikats",
};

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_locale_tags() {
        assert_eq!("de".parse::<Locale>().unwrap(), Locale::De);
        assert_eq!("de-DE".parse::<Locale>().unwrap(), Locale::De);
        assert_eq!("EN_gb".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn calendar_date_parsing_is_strict() {
        assert_eq!(parse_calendar_date("2021-04-21"), Some(date(2021, 4, 21)));
        assert_eq!(parse_calendar_date("2021-13-40"), None);
        assert_eq!(parse_calendar_date("2021-4-21"), None);
        assert_eq!(parse_calendar_date("2021-04-21T10:00:00Z"), None);
        assert_eq!(parse_calendar_date(""), None);
        for padded in ["+021-04-21", " 021-04-21", "-021-04-21", "2021- 4-21", "2021-04- 1"] {
            assert_eq!(parse_calendar_date(padded), None, "{padded:?} should be rejected");
        }
    }

    #[test]
    fn formats_dates_per_locale() {
        let en = DisplayContext::default();
        let de = DisplayContext::new(Locale::De, utc());

        assert_eq!(en.short_date(date(2021, 4, 1)), "4/1/21");
        assert_eq!(en.medium_date(date(2021, 4, 1)), "Apr 1, 2021");
        assert_eq!(de.short_date(date(2021, 4, 1)), "01.04.21");
        assert_eq!(de.medium_date(date(2021, 4, 1)), "01.04.2021");
    }

    #[test]
    fn timestamps_are_shifted_to_display_offset() {
        let ts = parse_timestamp("2021-05-29T22:34:17Z").expect("timestamp");

        let en = DisplayContext::default();
        assert_eq!(en.short_date_time(ts), "5/29/21, 10:34 PM");

        let plus_two = FixedOffset::east_opt(2 * 3600).expect("offset");
        let de = DisplayContext::new(Locale::De, plus_two);
        assert_eq!(de.short_date_time(ts), "30.05.21, 00:34");
    }

    #[test]
    fn rejects_malformed_timestamp() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2021-05-29").is_none());
    }

    #[test]
    fn fill_replaces_named_placeholder() {
        assert_eq!(fill("Valid until {date}", "date", "1/1/22"), "Valid until 1/1/22");
    }
}
