//! Terminal rendering for agenda types.
//!
//! Extension traits add colored output to agenda-core types using owo_colors.

use agenda_core::AgendaError;
use agenda_core::location::Location;
use agenda_core::meeting::Meeting;
use agenda_core::user::{Role, User};
use chrono::NaiveDate;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Location {
    fn render(&self) -> String {
        match self {
            Location::SalaWit => self.label().magenta().to_string(),
            Location::Virtual => self.label().cyan().to_string(),
            Location::Presencial => self.label().yellow().to_string(),
        }
    }
}

impl Render for Meeting {
    fn render(&self) -> String {
        let time = format!("{}-{}", self.start_time(), self.end_time());
        format!(
            "{} {} {} {} {}",
            time.bold(),
            self.title,
            format!("({})", self.client).dimmed(),
            self.executive.name.green(),
            format!("[{}]", self.location.render()),
        )
    }
}

impl Render for User {
    fn render(&self) -> String {
        let role = match self.role {
            Role::User => self.role.as_str().dimmed().to_string(),
            Role::SalaWit => self.role.as_str().magenta().to_string(),
        };
        format!(
            "{:>4}  {}  {}  {}",
            self.id.dimmed(),
            self.name.bold(),
            self.email,
            role
        )
    }
}

/// Day grid: one header per visible day followed by its meetings.
pub fn render_days(days: &[(NaiveDate, Vec<Meeting>)], today: NaiveDate) -> String {
    let mut lines = Vec::new();

    for (i, (day, meetings)) in days.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }

        let header = day.format("%a %d %b %Y").to_string();
        if *day == today {
            lines.push(format!("{} {}", header.bold().underline(), "(today)".dimmed()));
        } else {
            lines.push(header.bold().to_string());
        }

        if meetings.is_empty() {
            lines.push(format!("   {}", "No meetings".dimmed()));
        }
        for meeting in meetings {
            lines.push(format!("   {} {}", format!("#{}", meeting.id).dimmed(), meeting.render()));
        }
    }

    lines.join("\n")
}

/// Every field of one meeting.
pub fn render_details(meeting: &Meeting) -> String {
    let mut lines = vec![
        format!("{} {}", meeting.title.bold(), format!("#{}", meeting.id).dimmed()),
        format!("  {:<13} {}", "Client:", meeting.client),
        format!(
            "  {:<13} {} {}-{}",
            "When:",
            meeting.date().format("%a %d %b %Y"),
            meeting.start_time(),
            meeting.end_time()
        ),
        format!("  {:<13} {}", "Location:", meeting.location.render()),
        format!("  {:<13} {}", "Executive:", meeting.executive.name),
    ];

    if let Some(collaborator) = &meeting.collaborator {
        lines.push(format!("  {:<13} {}", "Collaborator:", collaborator.name));
    }

    if !meeting.attendees.is_empty() {
        lines.push(format!("  {:<13}", "Attendees:"));
        for attendee in &meeting.attendees {
            if attendee.email.is_empty() {
                lines.push(format!("    - {}", attendee.name));
            } else {
                lines.push(format!("    - {} {}", attendee.name, format!("<{}>", attendee.email).dimmed()));
            }
        }
    }

    lines.join("\n")
}

/// User-facing text for a failed command.
pub fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<AgendaError>() {
        Some(AgendaError::TimeConflict { message, conflicts }) if !conflicts.is_empty() => {
            format!(
                "{message}\n  Overlaps {} existing meeting{}.",
                conflicts.len(),
                if conflicts.len() == 1 { "" } else { "s" }
            )
        }
        Some(e) => e.to_string(),
        None => format!("{err:#}"),
    }
}
