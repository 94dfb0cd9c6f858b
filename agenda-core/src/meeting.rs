//! Resolved meetings as displayed by the calendar, and the form state used to
//! create or edit them.

use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::error::{AgendaError, AgendaResult};
use crate::location::Location;

/// A user reference on a meeting: display name plus backend id when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRef {
    pub name: String,
    pub id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// A meeting with its relations resolved to display names.
///
/// Local date and clock times are never stored; they are read off the zoned
/// start/end instants so they cannot drift from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub client: String,
    pub executive: PersonRef,
    pub collaborator: Option<PersonRef>,
    pub location: Location,
    pub start_at: DateTime<Tz>,
    pub end_at: DateTime<Tz>,
    pub attendees: Vec<Attendee>,
}

impl Meeting {
    /// Local calendar date of the start instant.
    pub fn date(&self) -> NaiveDate {
        self.start_at.date_naive()
    }

    /// Zero-padded 24h `HH:MM`.
    pub fn start_time(&self) -> String {
        self.start_at.format("%H:%M").to_string()
    }

    pub fn end_time(&self) -> String {
        self.end_at.format("%H:%M").to_string()
    }

    pub fn date_key(&self) -> String {
        self.date().format("%Y-%m-%d").to_string()
    }
}

/// Meetings on `day`, earliest first. `HH:MM` strings compare correctly
/// because both are zero-padded 24h times.
pub fn bucket_by_day<'a>(meetings: &'a [Meeting], day: NaiveDate) -> Vec<&'a Meeting> {
    let key = day.format("%Y-%m-%d").to_string();
    let mut bucket: Vec<&Meeting> = meetings.iter().filter(|m| m.date_key() == key).collect();
    bucket.sort_by_key(|m| m.start_time());
    bucket
}

/// Create/edit form contents, in display terms (names and local wall-clock
/// times). Converted to the wire shape by `resolve::prepare_for_write`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingDraft {
    pub title: String,
    pub client: String,
    pub executive: String,
    pub collaborator: Option<String>,
    pub location: Location,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Attendee ids; `None` leaves the server-side list untouched.
    pub attendees: Option<Vec<i64>>,
}

impl MeetingDraft {
    /// Pre-fill an edit form from a resolved meeting.
    pub fn from_meeting(meeting: &Meeting) -> Self {
        MeetingDraft {
            title: meeting.title.clone(),
            client: meeting.client.clone(),
            executive: meeting.executive.name.clone(),
            collaborator: meeting.collaborator.as_ref().map(|c| c.name.clone()),
            location: meeting.location,
            date: meeting.date(),
            start_time: meeting.start_at.time(),
            end_time: meeting.end_at.time(),
            attendees: Some(meeting.attendees.iter().map(|a| a.id).collect()),
        }
    }

    /// Required-field checks done before anything is sent.
    /// Start/end ordering is not checked here; the server rejects it.
    pub fn validate(&self) -> AgendaResult<()> {
        if self.title.trim().is_empty() {
            return Err(AgendaError::Validation("Title is required".into()));
        }
        if self.client.trim().is_empty() {
            return Err(AgendaError::Validation("Client is required".into()));
        }
        if self.executive.trim().is_empty() {
            return Err(AgendaError::Validation(
                "Select or enter an executive".into(),
            ));
        }
        Ok(())
    }
}

/// Parse `HH:MM` (or `HH:MM:SS`) form input.
pub fn parse_clock(input: &str) -> AgendaResult<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|_| AgendaError::Validation(format!("Invalid time '{input}'. Expected HH:MM")))
}

/// Parse `YYYY-MM-DD` form input.
pub fn parse_day(input: &str) -> AgendaResult<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        AgendaError::Validation(format!("Invalid date '{input}'. Expected YYYY-MM-DD"))
    })
}
