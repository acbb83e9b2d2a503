//! Report time windows.
//!
//! All windows are computed in UTC. `since`/`until` are sent to GitHub as
//! RFC 3339 timestamps and the window is inclusive at both ends.

use anyhow::{Context, Result, bail};
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, time};
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// End of the early-morning spill-over counted towards the previous day.
const OVERNIGHT_CUTOFF_HOUR: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    /// Calendar day the report is filed under (`YYYY-MM-DD`).
    pub report_date: String,
}

impl TimeWindow {
    /// The whole UTC day containing `now`: 00:00:00 through 23:59:59.
    pub fn today(now: OffsetDateTime) -> Self {
        let date = now.to_offset(UtcOffset::UTC).date();
        Self {
            start: date.midnight().assume_utc(),
            end: date.with_time(time!(23:59:59)).assume_utc(),
            report_date: format_date(date),
        }
    }

    /// Yesterday from 00:00 until 06:00 today, filed under yesterday.
    ///
    /// Before 06:00 the window ends at `now` instead.
    pub fn overnight(now: OffsetDateTime) -> Self {
        let now = now.to_offset(UtcOffset::UTC);
        let today = now.date();
        let yesterday = today - Duration::days(1);
        let cutoff = today.with_time(time!(6:00)).assume_utc();
        let end = if now.hour() < OVERNIGHT_CUTOFF_HOUR {
            now
        } else {
            cutoff
        };
        Self {
            start: yesterday.midnight().assume_utc(),
            end,
            report_date: format_date(yesterday),
        }
    }

    /// A custom window from `YYYY-MM-DD HH:MM` strings interpreted as UTC.
    ///
    /// `report_date` defaults to the start's calendar day.
    pub fn custom(start: &str, end: &str, report_date: Option<&str>) -> Result<Self> {
        let start = parse_date_time(start)?;
        let end = parse_date_time(end)?;
        if end < start {
            bail!("end time must not be before start time");
        }
        let report_date = match report_date.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => format_date(parse_date(raw)?),
            None => format_date(start.date()),
        };
        Ok(Self {
            start,
            end,
            report_date,
        })
    }

    pub fn since_param(&self) -> Result<String> {
        self.start
            .format(&Rfc3339)
            .context("failed to format window start")
    }

    pub fn until_param(&self) -> Result<String> {
        self.end.format(&Rfc3339).context("failed to format window end")
    }

    /// Human-readable `YYYY-MM-DD HH:MM ~ YYYY-MM-DD HH:MM`.
    pub fn describe(&self) -> String {
        let fmt = |t: OffsetDateTime| {
            t.format(DATE_TIME_FORMAT).unwrap_or_else(|_| t.to_string())
        };
        format!("{} ~ {}", fmt(self.start), fmt(self.end))
    }
}

/// Today's UTC calendar day as `YYYY-MM-DD`.
pub fn today_utc() -> String {
    format_date(OffsetDateTime::now_utc().date())
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

/// Parse and normalize a `YYYY-MM-DD` day.
pub fn parse_date(raw: &str) -> Result<Date> {
    Date::parse(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", raw.trim()))
}

fn parse_date_time(raw: &str) -> Result<OffsetDateTime> {
    PrimitiveDateTime::parse(raw.trim(), DATE_TIME_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .with_context(|| {
            format!(
                "invalid date/time '{}', expected YYYY-MM-DD HH:MM",
                raw.trim()
            )
        })
}
