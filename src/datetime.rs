//! Date handling for syndication feeds.
//!
//! RSS publishers are inconsistent about date formats, so parsing walks a
//! fixed list of layouts and takes the first one that fits.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Layout used when rendering a stored timestamp as an RSS build date.
pub const BUILD_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unable to parse date: {0}")]
pub struct DateParseError(pub String);

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone, Copy)]
enum Zone {
    Named,
    Numeric,
    Rfc3339,
    Naive,
}

struct Layout {
    /// Input starts with an abbreviated weekday and a comma.
    weekday: bool,
    format: &'static str,
    zone: Zone,
}

const LAYOUTS: &[Layout] = &[
    // RFC1123: "Mon, 02 Jan 2006 15:04:05 MST"
    Layout {
        weekday: true,
        format: "%d %b %Y %H:%M:%S",
        zone: Zone::Named,
    },
    // RFC1123Z: "Mon, 02 Jan 2006 15:04:05 -0700"
    Layout {
        weekday: true,
        format: "%d %b %Y %H:%M:%S %z",
        zone: Zone::Numeric,
    },
    // RFC822: "02 Jan 06 15:04 MST"
    Layout {
        weekday: false,
        format: "%d %b %y %H:%M",
        zone: Zone::Named,
    },
    // RFC822Z: "02 Jan 06 15:04 -0700"
    Layout {
        weekday: false,
        format: "%d %b %y %H:%M %z",
        zone: Zone::Numeric,
    },
    Layout {
        weekday: false,
        format: "",
        zone: Zone::Rfc3339,
    },
    Layout {
        weekday: false,
        format: "%Y-%m-%d %H:%M:%S",
        zone: Zone::Naive,
    },
    Layout {
        weekday: false,
        format: "%Y-%m-%dT%H:%M:%S",
        zone: Zone::Naive,
    },
    // "Mon, 2 Jan 2006 15:04:05 MST"
    Layout {
        weekday: true,
        format: "%e %b %Y %H:%M:%S",
        zone: Zone::Named,
    },
    // "Mon, 2 Jan 2006 15:04:05 -0700"
    Layout {
        weekday: true,
        format: "%e %b %Y %H:%M:%S %z",
        zone: Zone::Numeric,
    },
];

/// Parse a feed date. An empty string means "now".
///
/// Naive layouts are read as UTC. The weekday prefix is checked for shape
/// only; publishers frequently get it wrong.
pub fn parse_rss_date(text: &str) -> Result<DateTime<Utc>, DateParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Utc::now());
    }

    LAYOUTS
        .iter()
        .find_map(|layout| parse_with(layout, text))
        .ok_or_else(|| DateParseError(text.to_string()))
}

/// Render a timestamp the way RSS channels render `lastBuildDate`.
pub fn format_build_date(dt: &DateTime<Utc>) -> String {
    dt.format(BUILD_DATE_FORMAT).to_string()
}

fn parse_with(layout: &Layout, text: &str) -> Option<DateTime<Utc>> {
    let text = if layout.weekday {
        strip_weekday(text)?
    } else {
        text
    };

    match layout.zone {
        Zone::Named => {
            let (body, zone) = text.rsplit_once(' ')?;
            let offset = named_zone_offset(zone)?;
            let naive = NaiveDateTime::parse_from_str(body.trim_end(), layout.format).ok()?;
            offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
        }
        Zone::Numeric => DateTime::parse_from_str(text, layout.format)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Zone::Rfc3339 => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Zone::Naive => NaiveDateTime::parse_from_str(text, layout.format)
            .ok()
            .map(|naive| naive.and_utc()),
    }
}

fn strip_weekday(text: &str) -> Option<&str> {
    let (weekday, rest) = text.split_once(',')?;
    if weekday.len() == 3 && weekday.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// Offset for an alphabetic zone abbreviation. Unknown abbreviations are
/// accepted with a zero offset.
fn named_zone_offset(zone: &str) -> Option<FixedOffset> {
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let hours = match zone.to_ascii_uppercase().as_str() {
        "UT" | "UTC" | "GMT" | "Z" => 0,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ if zone.len() >= 3 => 0,
        _ => return None,
    };

    FixedOffset::east_opt(hours * 3600)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Clock that only moves when told to.
    pub(crate) struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        pub(crate) fn at(rfc3339: &str) -> Self {
            let dt = DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc);
            Self(Mutex::new(dt))
        }

        pub(crate) fn advance(&self, by: chrono::Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_rfc1123_with_named_zone() {
        let parsed = parse_rss_date("Mon, 02 Jan 2006 15:04:05 MST").unwrap();
        assert_eq!(parsed, utc("2006-01-02T22:04:05Z"));
    }

    #[test]
    fn test_rfc1123_gmt() {
        let parsed = parse_rss_date("Tue, 02 Jan 2024 10:00:00 GMT").unwrap();
        assert_eq!(parsed, utc("2024-01-02T10:00:00Z"));
    }

    #[test]
    fn test_rfc1123_numeric_zone() {
        let parsed = parse_rss_date("Mon, 02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(parsed, utc("2006-01-02T22:04:05Z"));
    }

    #[test]
    fn test_rfc822_variants() {
        assert_eq!(
            parse_rss_date("02 Jan 06 15:04 UTC").unwrap(),
            utc("2006-01-02T15:04:00Z")
        );
        assert_eq!(
            parse_rss_date("02 Jan 06 15:04 +0100").unwrap(),
            utc("2006-01-02T14:04:00Z")
        );
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            parse_rss_date("2006-01-02T15:04:05+02:00").unwrap(),
            utc("2006-01-02T13:04:05Z")
        );
    }

    #[test]
    fn test_naive_layouts_are_utc() {
        assert_eq!(
            parse_rss_date("2006-01-02 15:04:05").unwrap(),
            utc("2006-01-02T15:04:05Z")
        );
        assert_eq!(
            parse_rss_date("2006-01-02T15:04:05").unwrap(),
            utc("2006-01-02T15:04:05Z")
        );
    }

    #[test]
    fn test_unpadded_day() {
        assert_eq!(
            parse_rss_date("Mon, 2 Jan 2006 15:04:05 GMT").unwrap(),
            utc("2006-01-02T15:04:05Z")
        );
        assert_eq!(
            parse_rss_date("Mon, 2 Jan 2006 15:04:05 +0000").unwrap(),
            utc("2006-01-02T15:04:05Z")
        );
    }

    #[test]
    fn test_wrong_weekday_is_tolerated() {
        // 2024-01-02 was a Tuesday.
        assert_eq!(
            parse_rss_date("Mon, 02 Jan 2024 09:00:00 GMT").unwrap(),
            utc("2024-01-02T09:00:00Z")
        );
    }

    #[test]
    fn test_unknown_abbreviation_has_zero_offset() {
        assert_eq!(
            parse_rss_date("Mon, 02 Jan 2006 15:04:05 XYZ").unwrap(),
            utc("2006-01-02T15:04:05Z")
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(
            parse_rss_date("  2006-01-02T15:04:05Z \n").unwrap(),
            utc("2006-01-02T15:04:05Z")
        );
    }

    #[test]
    fn test_empty_means_now() {
        let before = Utc::now();
        let parsed = parse_rss_date("").unwrap();
        let after = Utc::now();
        assert!(parsed >= before && parsed <= after);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert_eq!(
            parse_rss_date("not-a-date"),
            Err(DateParseError("not-a-date".into()))
        );
    }

    #[test]
    fn test_format_build_date() {
        assert_eq!(
            format_build_date(&utc("2024-01-02T10:00:00Z")),
            "Tue, 02 Jan 2024 10:00:00 GMT"
        );
    }

    #[test]
    fn test_build_date_round_trips_through_parser() {
        let dt = utc("2023-11-05T08:09:10Z");
        assert_eq!(parse_rss_date(&format_build_date(&dt)).unwrap(), dt);
    }
}
