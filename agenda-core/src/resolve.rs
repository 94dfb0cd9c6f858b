//! Translation between backend meeting records and display meetings.
//!
//! Reads resolve ids to names through the user directory; writes map names
//! back to ids. Neither direction fails on an unknown user: reads fall back to
//! a placeholder label, writes omit the id and let the server decide.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::constants::NO_EXECUTIVE_LABEL;
use crate::error::{AgendaError, AgendaResult};
use crate::meeting::{Attendee, Meeting, MeetingDraft, PersonRef};
use crate::user::UserDirectory;
use crate::wire::{MeetingPayload, RawMeeting, UserRef, WireId};

fn placeholder(kind: &str, id: &WireId) -> String {
    format!("{kind} {id}")
}

/// Resolve a relation given either inline (`executive`) or as a separate id
/// field (`executive_id`). Returns `None` when neither is present.
fn resolve_person(
    inline: Option<&UserRef>,
    id_field: Option<&WireId>,
    users: &UserDirectory,
    kind: &str,
) -> Option<PersonRef> {
    match (inline, id_field) {
        (Some(UserRef::Embedded(embedded)), _) => Some(PersonRef {
            name: embedded.name.clone().unwrap_or_default(),
            id: embedded.id.as_ref().and_then(WireId::as_i64),
        }),
        (Some(UserRef::Id(id)), _) | (None, Some(id)) => {
            let numeric = id.as_i64();
            match numeric.and_then(|n| users.by_id(n)) {
                Some(user) => Some(PersonRef {
                    name: user.name.clone(),
                    id: Some(user.id),
                }),
                None => {
                    tracing::warn!("No user found for {kind} id {id}");
                    Some(PersonRef {
                        name: placeholder(kind, id),
                        id: numeric,
                    })
                }
            }
        }
        (None, None) => None,
    }
}

fn resolve_attendee(attendee: &UserRef, users: &UserDirectory) -> Option<Attendee> {
    match attendee {
        UserRef::Embedded(embedded) => Some(Attendee {
            id: embedded.id.as_ref().and_then(WireId::as_i64)?,
            name: embedded.name.clone().unwrap_or_default(),
            email: embedded.email.clone().unwrap_or_default(),
        }),
        UserRef::Id(id) => {
            let numeric = id.as_i64()?;
            Some(match users.by_id(numeric) {
                Some(user) => Attendee {
                    id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                },
                None => Attendee {
                    id: numeric,
                    name: placeholder("Usuario", id),
                    email: String::new(),
                },
            })
        }
    }
}

/// Turn a backend record into a display meeting in timezone `tz`.
pub fn resolve(raw: &RawMeeting, users: &UserDirectory, tz: Tz) -> Meeting {
    let executive = resolve_person(
        raw.executive.as_ref(),
        raw.executive_id.as_ref(),
        users,
        "Ejecutivo",
    )
    .unwrap_or_else(|| PersonRef {
        name: NO_EXECUTIVE_LABEL.to_string(),
        id: None,
    });

    let collaborator = resolve_person(
        raw.collaborator.as_ref(),
        raw.collaborator_id.as_ref(),
        users,
        "Colaborador",
    )
    .filter(|c| !c.name.is_empty());

    let attendees = raw
        .attendees
        .iter()
        .flatten()
        .filter_map(|a| resolve_attendee(a, users))
        .collect();

    Meeting {
        id: raw.id.to_string(),
        title: raw.title.clone(),
        client: raw.client.clone(),
        executive,
        collaborator,
        location: raw.location,
        start_at: raw.start_at.with_timezone(&tz),
        end_at: raw.end_at.with_timezone(&tz),
        attendees,
    }
}

fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> AgendaResult<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            AgendaError::Validation(format!(
                "{} {} does not exist in {}",
                date,
                time.format("%H:%M"),
                tz.name()
            ))
        })
}

fn lookup_id(name: Option<&str>, users: &UserDirectory, kind: &str) -> Option<i64> {
    let name = name.map(str::trim).filter(|n| !n.is_empty())?;
    match users.by_name(name) {
        Some(user) => Some(user.id),
        None => {
            tracing::warn!("No id found for {kind} '{name}'; sending without it");
            None
        }
    }
}

/// Build the backend payload for a create or update.
pub fn prepare_for_write(
    draft: &MeetingDraft,
    users: &UserDirectory,
    tz: Tz,
) -> AgendaResult<MeetingPayload> {
    Ok(MeetingPayload {
        title: draft.title.trim().to_string(),
        client: draft.client.trim().to_string(),
        location: draft.location,
        start_at: local_to_utc(draft.date, draft.start_time, tz)?,
        end_at: local_to_utc(draft.date, draft.end_time, tz)?,
        executive_id: lookup_id(Some(&draft.executive), users, "executive"),
        collaborator_id: lookup_id(draft.collaborator.as_deref(), users, "collaborator"),
        attendees: draft.attendees.clone(),
    })
}
