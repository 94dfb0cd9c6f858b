use agenda_core::calendar::{CalendarView, ViewMode};
use agenda_core::filter::LocationFilter;
use agenda_core::meeting::parse_day;
use anyhow::Result;
use owo_colors::OwoColorize;

use super::Context;
use crate::render::render_days;
use crate::utils::tui::with_spinner;

pub struct WeekOptions {
    pub date: Option<String>,
    pub single_day: bool,
    /// Steps forward (positive) or back (negative) from the starting view.
    pub offset: i64,
    pub executive: Option<String>,
    pub location: LocationFilter,
}

pub async fn run(options: WeekOptions) -> Result<()> {
    let ctx = Context::load()?;
    ctx.require_login().await?;

    let today = ctx.today();
    let date = match &options.date {
        Some(d) => parse_day(d)?,
        None => today,
    };

    let mut view = if options.single_day {
        CalendarView::at(date, ViewMode::SingleDay)
    } else {
        CalendarView::starting(date, ViewMode::MultiDay)
    };
    view.step(options.offset)?;

    let repo = ctx.repository(view);
    repo.set_executive(options.executive.clone());

    let location = options.location;
    with_spinner("Loading meetings", async {
        if location == LocationFilter::All {
            repo.refresh().await
        } else {
            repo.set_location(location).await
        }
    })
    .await?;

    let effective = repo.effective_location();
    if effective != location {
        println!(
            "{}",
            format!("Room account: showing {} only.", effective).dimmed()
        );
    }

    if let Some(name) = &options.executive {
        if !repo.executive_names().iter().any(|n| n == name) {
            println!("{}", format!("No executive named '{name}'.").yellow());
        }
    }

    let range = repo.view().range();
    println!(
        "{} {} to {}  {}",
        "Meetings".bold(),
        range.start.format("%d %b"),
        range.end.format("%d %b %Y"),
        format!(
            "executive: {}, location: {}",
            options.executive.as_deref().unwrap_or("all"),
            effective
        )
        .dimmed()
    );
    println!();
    println!("{}", render_days(&repo.day_buckets(), today));

    Ok(())
}
