//! Publication date resolution.
//!
//! Feeds disagree wildly on how they spell timestamps, and some omit them.
//! Every entry still gets exactly one instant in the target timezone:
//! the parser's structured time first, then the raw text through a lenient
//! parser, and finally the collection time as a tagged fallback.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use sn_core::{DateSource, RawEntry, ResolvedTimestamp};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%Y.%m.%d %H:%M:%S %z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y.%m.%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Offsets, in hours, of zone abbreviations seen in security feeds.
const ZONE_ABBREVIATIONS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("GMT", 0),
    ("UT", 0),
    ("Z", 0),
    ("KST", 9),
    ("JST", 9),
    ("CET", 1),
    ("CEST", 2),
    ("BST", 1),
    ("EST", -5),
    ("EDT", -4),
    ("CST", -6),
    ("CDT", -5),
    ("MST", -7),
    ("MDT", -6),
    ("PST", -8),
    ("PDT", -7),
];

#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    tz: FixedOffset,
}

impl DateResolver {
    pub fn new(tz: FixedOffset) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> FixedOffset {
        self.tz
    }

    /// Resolve the publication time of `entry`; `now` is the collection time
    /// used when nothing in the entry can be parsed.
    pub fn resolve(&self, entry: &RawEntry, now: DateTime<FixedOffset>) -> ResolvedTimestamp {
        if let Some(parsed) = entry.published_parsed {
            return ResolvedTimestamp::Resolved {
                at: self.tz.from_utc_datetime(&parsed),
                source: DateSource::Structured,
            };
        }

        if let Some(at) = entry.published.as_deref().and_then(|text| self.parse_text(text)) {
            return ResolvedTimestamp::Resolved {
                at,
                source: DateSource::Text,
            };
        }

        ResolvedTimestamp::FallbackUsed {
            at: now.with_timezone(&self.tz),
        }
    }

    /// Lenient parse of a textual timestamp. Text without zone information
    /// is taken to be in the target timezone already.
    pub fn parse_text(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.parse_with_abbreviation(text)
            .or_else(|| self.parse_with_offset(text))
            .or_else(|| parse_naive(text).and_then(|naive| self.tz.from_local_datetime(&naive).single()))
            .map(|at| at.with_timezone(&self.tz))
    }

    fn parse_with_offset(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc2822(text)
            .or_else(|_| DateTime::parse_from_rfc3339(text))
            .ok()
            .or_else(|| {
                OFFSET_FORMATS
                    .iter()
                    .find_map(|format| DateTime::parse_from_str(text, format).ok())
            })
    }

    // Runs before the RFC 2822 parser, which does not know zones like KST.
    fn parse_with_abbreviation(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        let (rest, zone) = text.rsplit_once(' ')?;
        let hours = ZONE_ABBREVIATIONS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(zone))
            .map(|(_, hours)| *hours)?;
        let offset = FixedOffset::east_opt(hours * 3600)?;
        let naive = parse_naive(rest.trim())?;
        offset.from_local_datetime(&naive).single()
    }
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
