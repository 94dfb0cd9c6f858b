use agenda_core::calendar::{CalendarView, ViewMode};
use agenda_core::meeting::{MeetingDraft, parse_clock, parse_day};
use anyhow::Result;
use chrono::Duration;

use super::{Context, form};
use crate::MeetingArgs;
use crate::utils::tui::with_spinner;

pub async fn run(args: MeetingArgs) -> Result<()> {
    let ctx = Context::load()?;
    let user = ctx.require_login().await?;
    if user.role.is_room_bound() {
        anyhow::bail!("Room accounts cannot create meetings.");
    }

    let day = match &args.day {
        Some(d) => parse_day(d)?,
        None => ctx.today(),
    };
    let repo = ctx.repository(CalendarView::starting(day, ViewMode::MultiDay));
    with_spinner("Loading users", repo.refresh()).await?;

    let names = repo.executive_names();
    let interactive = args.title.is_none() || args.start.is_none();

    let title = match args.title {
        Some(t) => t,
        None => form::text("Title", None)?,
    };
    let client = match args.client {
        Some(c) => c,
        None => form::text("Client", None)?,
    };
    let executive = match args.executive {
        Some(e) => e,
        None => form::pick_name("Executive", &names, None)?,
    };
    let collaborator = match args.collaborator {
        Some(c) => form::non_empty(c),
        None if interactive => form::pick_optional_name("Collaborator", &names, None)?,
        None => None,
    };
    let location = match args.location {
        Some(l) => l,
        None => form::pick_location(None)?,
    };
    let date = if args.day.is_some() {
        day
    } else {
        form::parsed("Date (YYYY-MM-DD)", Some(day.to_string()), parse_day)?
    };
    let start_time = match args.start {
        Some(s) => parse_clock(&s)?,
        None => form::parsed("Start (HH:MM)", None, parse_clock)?,
    };
    let end_time = match args.end {
        Some(e) => parse_clock(&e)?,
        None => {
            let suggested = (start_time + Duration::hours(1)).format("%H:%M").to_string();
            form::parsed("End (HH:MM)", Some(suggested), parse_clock)?
        }
    };

    let draft = MeetingDraft {
        title,
        client,
        executive,
        collaborator,
        location,
        date,
        start_time,
        end_time,
        attendees: None,
    };

    let outcome = with_spinner("Saving meeting", repo.create(&draft)).await?;

    if interactive {
        println!();
    }
    form::report(
        outcome,
        &format!(
            "Created: {} on {} {}-{}",
            draft.title.trim(),
            draft.date,
            draft.start_time.format("%H:%M"),
            draft.end_time.format("%H:%M")
        ),
    );
    Ok(())
}
