//! A single message from a WhatsApp chat export.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::error::RowError;

/// `[DD/MM/YY, HH:MM:SS] Sender Name: message content`
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[([0-9]{2})/([0-9]{2})/([0-9]{2}), ([0-9]{2}:[0-9]{2}:[0-9]{2})\] (.*?): (.*)$",
    )
    .expect("line pattern is a valid regex")
});

/// Two-digit years are expanded as `2000 + YY`.
pub const CENTURY: i32 = 2000;

/// `strftime` layout of the `when` payload field and the rich content date.
pub const WHEN_FORMAT: &str = "%A, %d %B %Y";

/// Format a date with its weekday name, e.g. "Monday, 05 January 2024".
pub fn format_when(date: NaiveDate) -> String {
    date.format(WHEN_FORMAT).to_string()
}

/// Parse a date previously produced by [`format_when`].
pub fn parse_when(when: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(when, WHEN_FORMAT).ok()
}

/// One parsed chat line.
///
/// Built only by [`Message::from_raw`]; the derived date and rich content are
/// computed once there and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    timestamp: String,
    sender: String,
    content: String,
    message_date: NaiveDate,
    rich_content: String,
}

impl Message {
    /// Parse one raw export line.
    ///
    /// Parsing happens in two stages: the line grammar, then calendar
    /// normalization of the date. Either stage fails with a [`RowError`]
    /// carrying the line verbatim.
    pub fn from_raw(raw: &str) -> Result<Self, RowError> {
        let caps = LINE_PATTERN
            .captures(raw)
            .ok_or_else(|| RowError::new(raw, "Message does not match expected format."))?;

        let (day, month, year) = (&caps[1], &caps[2], &caps[3]);
        let message_date = calendar_date(day, month, year).ok_or_else(|| {
            RowError::new(raw, format!("invalid calendar date {day}/{month}/{year}"))
        })?;

        let timestamp = format!("{day}/{month}/{year}, {}", &caps[4]);
        let sender = caps[5].to_string();
        let content = caps[6].to_string();
        let rich_content = format!(
            "Sender: {}\nWhen: {}\nMessage: {}",
            sender,
            format_when(message_date),
            content
        );

        Ok(Self {
            timestamp,
            sender,
            content,
            message_date,
            rich_content,
        })
    }

    /// Raw `DD/MM/YY, HH:MM:SS` timestamp.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Date component of the timestamp.
    pub fn message_date(&self) -> NaiveDate {
        self.message_date
    }

    /// Weekday-qualified date, as stored in the `when` payload field.
    pub fn when(&self) -> String {
        format_when(self.message_date)
    }

    /// The document embedded for retrieval.
    pub fn rich_content(&self) -> &str {
        &self.rich_content
    }
}

impl FromStr for Message {
    type Err = RowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::from_raw(s)
    }
}

fn calendar_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(CENTURY + year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_valid_line() {
        let msg = Message::from_raw("[01/02/23, 10:15:30] Alice: Hello there").unwrap();
        assert_eq!(msg.sender(), "Alice");
        assert_eq!(msg.content(), "Hello there");
        assert_eq!(msg.timestamp(), "01/02/23, 10:15:30");
        assert_eq!(
            msg.message_date(),
            NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_sender_stops_at_first_delimiter() {
        let msg = Message::from_raw("[01/02/23, 10:15:30] Bob: note: buy milk").unwrap();
        assert_eq!(msg.sender(), "Bob");
        assert_eq!(msg.content(), "note: buy milk");
    }

    #[test]
    fn test_sender_and_content_kept_verbatim() {
        let msg =
            Message::from_raw("[01/02/23, 10:15:30] Zoë ~ 🌻:   spaced   out  ").unwrap();
        assert_eq!(msg.sender(), "Zoë ~ 🌻");
        assert_eq!(msg.content(), "  spaced   out  ");
    }

    #[test]
    fn test_empty_content_after_delimiter() {
        let msg = Message::from_raw("[01/02/23, 10:15:30] Alice: ").unwrap();
        assert_eq!(msg.content(), "");
    }

    #[test]
    fn test_invalid_line_keeps_row() {
        let err = Message::from_raw("not a valid line").unwrap_err();
        assert_eq!(err.row, "not a valid line");
        assert_eq!(err.reason, "Message does not match expected format.");
    }

    #[test]
    fn test_grammar_failures() {
        let lines = [
            "",
            "01/02/23, 10:15:30 Alice: no brackets",
            "[01/02/23, 10:15:30] Alice no colon",
            "[01/02/23, 10:15:30] Alice:",
            "[1/2/23, 10:15:30] Alice: short date",
            "[01/02/2023, 10:15:30] Alice: long year",
            "[01/02/23 10:15:30] Alice: missing comma",
            "[01/02/23, 10:15] Alice: missing seconds",
            "prefix [01/02/23, 10:15:30] Alice: not anchored",
        ];
        for line in lines {
            let err = Message::from_raw(line).unwrap_err();
            assert_eq!(err.row, line);
        }
    }

    #[test]
    fn test_calendar_failure_after_grammar_match() {
        let err = Message::from_raw("[31/04/23, 10:15:30] Alice: April has 30 days").unwrap_err();
        assert_eq!(err.row, "[31/04/23, 10:15:30] Alice: April has 30 days");
        assert!(err.reason.contains("calendar"));

        assert!(Message::from_raw("[29/02/23, 10:15:30] Alice: not a leap year").is_err());
        assert!(Message::from_raw("[29/02/24, 10:15:30] Alice: leap year").is_ok());
        assert!(Message::from_raw("[01/13/23, 10:15:30] Alice: month 13").is_err());
    }

    #[test]
    fn test_two_digit_year_expansion() {
        let msg = Message::from_raw("[15/06/99, 08:00:00] Carol: late").unwrap();
        assert_eq!(msg.message_date().year(), 2099);
        let msg = Message::from_raw("[15/06/00, 08:00:00] Carol: early").unwrap();
        assert_eq!(msg.message_date().year(), 2000);
    }

    #[test]
    fn test_rich_content_has_weekday() {
        let msg = Message::from_raw("[05/01/24, 09:00:00] Alice: Happy new year").unwrap();
        assert_eq!(
            msg.rich_content(),
            "Sender: Alice\nWhen: Friday, 05 January 2024\nMessage: Happy new year"
        );
        let weekday = msg.message_date().format("%A").to_string();
        assert!(msg.rich_content().contains(&weekday));
        assert!(!msg.rich_content().contains("05/01/24"));
    }

    #[test]
    fn test_when_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let when = format_when(date);
        assert_eq!(when, "Monday, 01 January 2024");
        assert_eq!(parse_when(&when), Some(date));
        assert_eq!(parse_when("yesterday"), None);
    }

    #[test]
    fn test_from_str() {
        let msg: Message = "[01/02/23, 10:15:30] Alice: Hi".parse().unwrap();
        assert_eq!(msg.sender(), "Alice");
    }
}
