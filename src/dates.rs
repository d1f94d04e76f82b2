// ABOUTME: Named date layouts for the record mapper's `$date` conversion.
// ABOUTME: A closed enumeration of standard layouts mapped to chrono format patterns.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{Error, Result};

/// The standard layouts a `$date` annotation may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedLayout {
    Ansic,
    UnixDate,
    RubyDate,
    Rfc822,
    Rfc822Z,
    Rfc850,
    Rfc1123,
    Rfc1123Z,
    Rfc3339,
    /// RFC 3339 with exactly three fractional digits; the default layout
    Rfc3339Milli,
    Rfc3339Nano,
    Kitchen,
    Stamp,
    StampMilli,
    StampMicro,
    StampNano,
}

impl NamedLayout {
    pub const ALL: [NamedLayout; 16] = [
        NamedLayout::Ansic,
        NamedLayout::UnixDate,
        NamedLayout::RubyDate,
        NamedLayout::Rfc822,
        NamedLayout::Rfc822Z,
        NamedLayout::Rfc850,
        NamedLayout::Rfc1123,
        NamedLayout::Rfc1123Z,
        NamedLayout::Rfc3339,
        NamedLayout::Rfc3339Milli,
        NamedLayout::Rfc3339Nano,
        NamedLayout::Kitchen,
        NamedLayout::Stamp,
        NamedLayout::StampMilli,
        NamedLayout::StampMicro,
        NamedLayout::StampNano,
    ];

    /// The name used in annotations.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            NamedLayout::Ansic => "ANSIC",
            NamedLayout::UnixDate => "UnixDate",
            NamedLayout::RubyDate => "RubyDate",
            NamedLayout::Rfc822 => "RFC822",
            NamedLayout::Rfc822Z => "RFC822Z",
            NamedLayout::Rfc850 => "RFC850",
            NamedLayout::Rfc1123 => "RFC1123",
            NamedLayout::Rfc1123Z => "RFC1123Z",
            NamedLayout::Rfc3339 => "RFC3339",
            NamedLayout::Rfc3339Milli => "RFC3339Milli",
            NamedLayout::Rfc3339Nano => "RFC3339Nano",
            NamedLayout::Kitchen => "Kitchen",
            NamedLayout::Stamp => "Stamp",
            NamedLayout::StampMilli => "StampMilli",
            NamedLayout::StampMicro => "StampMicro",
            NamedLayout::StampNano => "StampNano",
        }
    }

    /// The chrono format pattern for this layout.
    #[must_use]
    pub const fn pattern(self) -> &'static str {
        match self {
            NamedLayout::Ansic => "%a %b %e %H:%M:%S %Y",
            NamedLayout::UnixDate => "%a %b %e %H:%M:%S %Z %Y",
            NamedLayout::RubyDate => "%a %b %d %H:%M:%S %z %Y",
            NamedLayout::Rfc822 => "%d %b %y %H:%M %Z",
            NamedLayout::Rfc822Z => "%d %b %y %H:%M %z",
            NamedLayout::Rfc850 => "%A, %d-%b-%y %H:%M:%S %Z",
            NamedLayout::Rfc1123 => "%a, %d %b %Y %H:%M:%S %Z",
            NamedLayout::Rfc1123Z => "%a, %d %b %Y %H:%M:%S %z",
            NamedLayout::Rfc3339 => "%Y-%m-%dT%H:%M:%S%:z",
            NamedLayout::Rfc3339Milli => "%Y-%m-%dT%H:%M:%S%.3f%:z",
            NamedLayout::Rfc3339Nano => "%Y-%m-%dT%H:%M:%S%.f%:z",
            NamedLayout::Kitchen => "%I:%M%p",
            NamedLayout::Stamp => "%b %e %H:%M:%S",
            NamedLayout::StampMilli => "%b %e %H:%M:%S%.3f",
            NamedLayout::StampMicro => "%b %e %H:%M:%S%.6f",
            NamedLayout::StampNano => "%b %e %H:%M:%S%.9f",
        }
    }

    /// Look up a layout by its annotation name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|layout| layout.name() == name)
    }

    const fn is_rfc3339(self) -> bool {
        matches!(
            self,
            NamedLayout::Rfc3339 | NamedLayout::Rfc3339Milli | NamedLayout::Rfc3339Nano
        )
    }
}

impl fmt::Display for NamedLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a `$date` field's text is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateLayout {
    Named(NamedLayout),
    /// A literal chrono `strftime` pattern
    Custom(String),
}

impl Default for DateLayout {
    fn default() -> Self {
        DateLayout::Named(NamedLayout::Rfc3339Milli)
    }
}

impl DateLayout {
    /// Resolve an annotation's date format: a named layout if the table has
    /// it, otherwise a custom pattern. An empty format is the default layout.
    #[must_use]
    pub fn resolve(format: &str) -> Self {
        if format.is_empty() {
            return Self::default();
        }
        NamedLayout::from_name(format).map_or_else(|| DateLayout::Custom(format.to_owned()), DateLayout::Named)
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            DateLayout::Named(layout) => layout.pattern(),
            DateLayout::Custom(pattern) => pattern,
        }
    }

    /// Parse `text` into a UTC instant.
    ///
    /// Patterns without an offset are read as UTC. Patterns without a date
    /// land on January 1st of year 0; patterns without a year land in year 0.
    pub fn parse(&self, text: &str) -> Result<DateTime<Utc>> {
        if let DateLayout::Named(layout) = self {
            if layout.is_rfc3339() {
                return DateTime::parse_from_rfc3339(text)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| self.parse_error(text, &e));
            }
        }
        parse_with_pattern(text, self.pattern()).map_err(|e| self.parse_error(text, &e))
    }

    fn parse_error(&self, text: &str, err: &chrono::ParseError) -> Error {
        Error::InvalidData(format!("cannot parse {text:?} as {self}: {err}"))
    }
}

impl fmt::Display for DateLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateLayout::Named(layout) => write!(f, "{layout}"),
            DateLayout::Custom(pattern) => write!(f, "{pattern:?}"),
        }
    }
}

fn parse_with_pattern(text: &str, pattern: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    let first_error = match DateTime::parse_from_str(text, pattern) {
        Ok(t) => return Ok(t.with_timezone(&Utc)),
        Err(err) => err,
    };
    if let Some(t) = parse_naive(text, pattern) {
        return Ok(t.and_utc());
    }
    if !has_year(pattern) {
        if let Some(t) = parse_naive(&format!("0000 {text}"), &format!("%Y {pattern}")) {
            return Ok(t.and_utc());
        }
    }
    match NaiveTime::parse_from_str(text, pattern) {
        Ok(time) => {
            let year_zero = NaiveDate::from_ymd_opt(0, 1, 1).unwrap_or(NaiveDate::MIN);
            Ok(year_zero.and_time(time).and_utc())
        }
        Err(_) => Err(first_error),
    }
}

fn parse_naive(text: &str, pattern: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, pattern)
        .ok()
        .or_else(|| NaiveDate::parse_from_str(text, pattern).ok().map(|d| d.and_time(NaiveTime::MIN)))
}

fn has_year(pattern: &str) -> bool {
    ["%Y", "%y", "%G", "%g", "%C", "%s", "%c", "%D", "%x", "%F", "%+"]
        .iter()
        .any(|spec| pattern.contains(spec))
}
