//! Builds Google Calendar "create event" deep links from an
//! `AppointmentRecord`. Pure: nothing here does I/O.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::Url;
use thiserror::Error;

use crate::appointment::AppointmentRecord;

pub const CALENDAR_RENDER_URL: &str = "https://calendar.google.com/calendar/render";
pub const FALLBACK_TITLE: &str = "Cleaning Appointment";
pub const TITLE_SEPARATOR: &str = " | ";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];
const UTC_BASIC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Where the values being linked came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkMode {
    /// Fields were just filled in by extraction
    Automatic,
    /// Fields were typed or edited by the user
    Manual,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot create a calendar link: {reason}")]
pub struct InvalidScheduleError {
    pub reason: String,
}

impl InvalidScheduleError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarLink {
    pub url: Url,
    pub mode: LinkMode,
}

impl CalendarLink {
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// Non-empty area, name and phone joined with a separator.
pub fn event_title(record: &AppointmentRecord) -> String {
    let parts: Vec<&str> = [
        record.area.as_str(),
        record.customer_name.as_str(),
        record.phone.as_str(),
    ]
    .into_iter()
    .filter(|s| !s.trim().is_empty())
    .collect();

    if parts.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        parts.join(TITLE_SEPARATOR)
    }
}

pub fn event_details(record: &AppointmentRecord) -> String {
    let mut lines = Vec::new();
    if !record.address.trim().is_empty() {
        lines.push(format!("Address: {}", record.address));
    }
    if !record.notes.trim().is_empty() {
        lines.push(format!("Notes: {}", record.notes));
    }
    lines.join("\n")
}

fn parse_time(label: &str, value: &str) -> Result<NaiveTime, InvalidScheduleError> {
    if value.is_empty() {
        return Err(InvalidScheduleError::new(format!("{} is missing", label)));
    }
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| {
            InvalidScheduleError::new(format!("{} {:?} is not a valid HH:MM time", label, value))
        })
}

fn to_utc_basic(
    label: &str,
    local: NaiveDateTime,
    tz: &Tz,
) -> Result<String, InvalidScheduleError> {
    // Ambiguous wall-clock times (DST fall back) take the earlier instant
    let zoned = tz.from_local_datetime(&local).earliest().ok_or_else(|| {
        InvalidScheduleError::new(format!(
            "{} {} does not exist in {}",
            label,
            local.format("%Y-%m-%d %H:%M"),
            tz.name()
        ))
    })?;
    Ok(zoned.with_timezone(&Utc).format(UTC_BASIC_FORMAT).to_string())
}

/// The `dates` parameter: `<start>/<end>` in UTC basic format.
pub fn event_dates(record: &AppointmentRecord, tz: &Tz) -> Result<String, InvalidScheduleError> {
    if record.date.is_empty() {
        return Err(InvalidScheduleError::new("date is missing"));
    }
    let date = NaiveDate::parse_from_str(&record.date, DATE_FORMAT).map_err(|_| {
        InvalidScheduleError::new(format!("date {:?} is not a valid YYYY-MM-DD date", record.date))
    })?;
    let start = parse_time("start time", &record.start_time)?;
    let end = parse_time("end time", &record.end_time)?;

    if end <= start {
        return Err(InvalidScheduleError::new(format!(
            "end time {} must be after start time {}",
            record.end_time, record.start_time
        )));
    }

    let start = to_utc_basic("start time", date.and_time(start), tz)?;
    let end = to_utc_basic("end time", date.and_time(end), tz)?;
    Ok(format!("{}/{}", start, end))
}

/// Build the event creation link for `record` rendered in `tz`.
///
/// Automatic mode trims the values first since they come straight
/// from the model; manual mode uses them exactly as entered.
pub fn build_calendar_link(
    record: &AppointmentRecord,
    mode: LinkMode,
    tz: &Tz,
) -> Result<CalendarLink, InvalidScheduleError> {
    let trimmed;
    let record = match mode {
        LinkMode::Automatic => {
            trimmed = record.trimmed();
            &trimmed
        }
        LinkMode::Manual => record,
    };

    let dates = event_dates(record, tz)?;

    let mut url = Url::parse(CALENDAR_RENDER_URL).expect("Invalid calendar URL");
    url.query_pairs_mut()
        .append_pair("action", "TEMPLATE")
        .append_pair("text", &event_title(record))
        .append_pair("dates", &dates)
        .append_pair("details", &event_details(record))
        .append_pair("location", &record.address)
        .append_pair("ctz", tz.name());

    tracing::debug!("Built {:?} calendar link: {}", mode, url);

    Ok(CalendarLink { url, mode })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TAIPEI: Tz = chrono_tz::Asia::Taipei;

    fn record(date: &str, start: &str, end: &str) -> AppointmentRecord {
        AppointmentRecord {
            date: date.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            ..Default::default()
        }
    }

    fn query(link: &CalendarLink) -> HashMap<String, String> {
        link.url.query_pairs().into_owned().collect()
    }

    #[test]
    fn test_title_joins_non_empty_fields() {
        let mut r = AppointmentRecord {
            area: String::from("中山區"),
            customer_name: String::from("王小明"),
            phone: String::new(),
            ..Default::default()
        };
        assert_eq!(event_title(&r), "中山區 | 王小明");

        r.phone = String::from("0912345678");
        assert_eq!(event_title(&r), "中山區 | 王小明 | 0912345678");

        r.area = String::new();
        assert_eq!(event_title(&r), "王小明 | 0912345678");
    }

    #[test]
    fn test_title_fallback() {
        assert_eq!(event_title(&AppointmentRecord::default()), FALLBACK_TITLE);
    }

    #[test]
    fn test_details() {
        let mut r = AppointmentRecord {
            address: String::from("台北市中山區南京東路1號"),
            notes: String::from("有貓"),
            ..Default::default()
        };
        assert_eq!(event_details(&r), "Address: 台北市中山區南京東路1號\nNotes: 有貓");
        r.address = String::new();
        assert_eq!(event_details(&r), "Notes: 有貓");
        r.notes = String::new();
        assert_eq!(event_details(&r), "");
    }

    #[test]
    fn test_dates_in_taipei() {
        let r = record("2025-03-01", "09:00", "12:30");
        assert_eq!(
            event_dates(&r, &TAIPEI).unwrap(),
            "20250301T010000Z/20250301T043000Z"
        );
    }

    #[test]
    fn test_dates_crossing_utc_midnight() {
        let r = record("2025-03-01", "07:00", "10:00");
        assert_eq!(
            event_dates(&r, &TAIPEI).unwrap(),
            "20250228T230000Z/20250301T020000Z"
        );
    }

    #[test]
    fn test_dates_accepts_seconds() {
        let r = record("2025-03-01", "09:00:00", "10:15:30");
        assert_eq!(
            event_dates(&r, &TAIPEI).unwrap(),
            "20250301T010000Z/20250301T021530Z"
        );
    }

    #[test]
    fn test_dates_offsets_follow_input() {
        // Every valid same-day range keeps the date and shifts by the zone offset
        for (start, end) in [("08:00", "09:00"), ("10:15", "18:45"), ("13:00", "23:59")] {
            let r = record("2025-06-15", start, end);
            let dates = event_dates(&r, &TAIPEI).unwrap();
            let (s, e) = dates.split_once('/').unwrap();
            let s = NaiveDateTime::parse_from_str(s, UTC_BASIC_FORMAT).unwrap();
            let e = NaiveDateTime::parse_from_str(e, UTC_BASIC_FORMAT).unwrap();
            let expected = NaiveTime::parse_from_str(end, "%H:%M").unwrap()
                - NaiveTime::parse_from_str(start, "%H:%M").unwrap();
            assert_eq!(e - s, expected);
            assert_eq!(
                s + chrono::Duration::hours(8),
                NaiveDate::from_ymd_opt(2025, 6, 15)
                    .unwrap()
                    .and_time(NaiveTime::parse_from_str(start, "%H:%M").unwrap())
            );
        }
    }

    #[test]
    fn test_invalid_schedule() {
        let cases = [
            record("", "09:00", "12:00"),
            record("2025-03-01", "", "12:00"),
            record("2025-03-01", "09:00", ""),
            record("2025/03/01", "09:00", "12:00"),
            record("2025-02-30", "09:00", "12:00"),
            record("2025-03-01", "9am", "12:00"),
            record("2025-03-01", "09:00", "25:00"),
            record("2025-03-01", "12:00", "09:00"),
            record("2025-03-01", "09:00", "09:00"),
        ];
        for r in cases {
            for mode in [LinkMode::Automatic, LinkMode::Manual] {
                let result = build_calendar_link(&r, mode, &TAIPEI);
                assert!(result.is_err(), "expected error for {:?}", r);
            }
        }
    }

    #[test]
    fn test_invalid_schedule_message_is_mode_independent() {
        let r = record("2025-03-01", "", "12:00");
        let auto = build_calendar_link(&r, LinkMode::Automatic, &TAIPEI).unwrap_err();
        let manual = build_calendar_link(&r, LinkMode::Manual, &TAIPEI).unwrap_err();
        assert_eq!(auto, manual);
        assert_eq!(auto.to_string(), "Cannot create a calendar link: start time is missing");
    }

    #[test]
    fn test_nonexistent_local_time() {
        // Clocks jump from 02:00 to 03:00 in New York
        let r = record("2025-03-09", "02:30", "04:00");
        let result = build_calendar_link(&r, LinkMode::Manual, &chrono_tz::America::New_York);
        assert!(result.unwrap_err().reason.contains("does not exist"));
    }

    #[test]
    fn test_build_link() {
        let r = AppointmentRecord {
            area: String::from("中山區"),
            customer_name: String::from("王小明"),
            phone: String::new(),
            date: String::from("2025-03-01"),
            start_time: String::from("09:00"),
            end_time: String::from("12:00"),
            address: String::from("台北市中山區南京東路1號"),
            notes: String::from("有貓"),
        };
        let link = build_calendar_link(&r, LinkMode::Manual, &TAIPEI).unwrap();
        assert_eq!(link.mode, LinkMode::Manual);
        assert!(link.as_str().starts_with(CALENDAR_RENDER_URL));

        let keys: Vec<String> = link.url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, vec!["action", "text", "dates", "details", "location", "ctz"]);

        let q = query(&link);
        assert_eq!(q["action"], "TEMPLATE");
        assert_eq!(q["text"], "中山區 | 王小明");
        assert_eq!(q["dates"], "20250301T010000Z/20250301T040000Z");
        assert_eq!(q["details"], "Address: 台北市中山區南京東路1號\nNotes: 有貓");
        assert_eq!(q["location"], "台北市中山區南京東路1號");
        assert_eq!(q["ctz"], "Asia/Taipei");
    }

    #[test]
    fn test_automatic_mode_trims_manual_mode_does_not() {
        let r = AppointmentRecord {
            area: String::from(" 大安區 "),
            date: String::from(" 2025-03-01"),
            start_time: String::from("09:00 "),
            end_time: String::from("11:00"),
            ..Default::default()
        };
        let link = build_calendar_link(&r, LinkMode::Automatic, &TAIPEI).unwrap();
        assert_eq!(link.mode, LinkMode::Automatic);
        assert_eq!(query(&link)["text"], "大安區");

        assert!(build_calendar_link(&r, LinkMode::Manual, &TAIPEI).is_err());
    }

    #[test]
    fn test_configured_timezone() {
        let r = record("2025-07-01", "09:00", "10:00");
        let link = build_calendar_link(&r, LinkMode::Manual, &chrono_tz::Europe::London).unwrap();
        let q = query(&link);
        assert_eq!(q["dates"], "20250701T080000Z/20250701T090000Z");
        assert_eq!(q["ctz"], "Europe/London");
    }
}
