//! Prompts shared by `add` and `edit`.

use agenda_core::AgendaResult;
use agenda_core::location::Location;
use agenda_core::meeting::{MeetingDraft, parse_clock, parse_day};
use agenda_core::repository::RefreshOutcome;
use anyhow::Result;
use dialoguer::{Input, Select};
use owo_colors::OwoColorize;

use crate::MeetingArgs;

const OTHER_NAME: &str = "(type a name)";

/// Prompt for free text, pre-filled with `current` when editing.
pub fn text(prompt: &str, current: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(format!("  {prompt}"));
    if let Some(current) = current {
        input = input.default(current.to_string());
    }
    Ok(input.interact_text()?)
}

/// Optional text; an empty answer means none.
pub fn optional_text(prompt: &str, current: Option<&str>) -> Result<Option<String>> {
    let answer: String = Input::new()
        .with_prompt(format!("  {prompt} (skip)"))
        .default(current.unwrap_or_default().to_string())
        .show_default(current.is_some())
        .allow_empty(true)
        .interact_text()?;
    Ok(non_empty(answer))
}

pub fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Prompt until the answer parses.
pub fn parsed<T>(prompt: &str, current: Option<String>, parse: fn(&str) -> AgendaResult<T>) -> Result<T> {
    loop {
        let answer = text(prompt, current.as_deref())?;
        match parse(&answer) {
            Ok(value) => return Ok(value),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}

const NO_NAME: &str = "(none)";

/// Select entries: the known names, "(type a name)", and a leading "(none)"
/// when the field is optional.
fn name_choices(names: &[String], optional: bool) -> Vec<&str> {
    let mut items = Vec::with_capacity(names.len() + 2);
    if optional {
        items.push(NO_NAME);
    }
    items.extend(names.iter().map(String::as_str));
    items.push(OTHER_NAME);
    items
}

fn select_name(prompt: &str, items: &[&str], current: Option<&str>) -> Result<usize> {
    let default = current
        .and_then(|c| items.iter().position(|i| *i == c))
        .unwrap_or(0);

    Ok(Select::new()
        .with_prompt(format!("  {prompt}"))
        .items(items)
        .default(default)
        .interact()?)
}

/// Pick a known name, or type one in.
pub fn pick_name(prompt: &str, names: &[String], current: Option<&str>) -> Result<String> {
    if names.is_empty() {
        return text(prompt, current);
    }

    let items = name_choices(names, false);
    match items[select_name(prompt, &items, current)?] {
        OTHER_NAME => text(prompt, current),
        name => Ok(name.to_string()),
    }
}

/// Like [`pick_name`] but "(none)" is offered first and is the default when
/// nothing is set.
pub fn pick_optional_name(prompt: &str, names: &[String], current: Option<&str>) -> Result<Option<String>> {
    if names.is_empty() {
        return optional_text(prompt, current);
    }

    let items = name_choices(names, true);
    match items[select_name(prompt, &items, current)?] {
        NO_NAME => Ok(None),
        OTHER_NAME => optional_text(prompt, current),
        name => Ok(Some(name.to_string())),
    }
}

pub fn pick_location(current: Option<Location>) -> Result<Location> {
    let items: Vec<&str> = Location::ALL.iter().map(|l| l.label()).collect();
    let default = current
        .and_then(|c| Location::ALL.iter().position(|l| *l == c))
        .unwrap_or(0);

    let selection = Select::new()
        .with_prompt("  Location")
        .items(&items)
        .default(default)
        .interact()?;
    Ok(Location::ALL[selection])
}

/// Overlay the flags given on the command line onto `draft`.
pub fn apply_args(draft: &mut MeetingDraft, args: MeetingArgs) -> Result<()> {
    if let Some(title) = args.title {
        draft.title = title;
    }
    if let Some(client) = args.client {
        draft.client = client;
    }
    if let Some(executive) = args.executive {
        draft.executive = executive;
    }
    if let Some(collaborator) = args.collaborator {
        draft.collaborator = non_empty(collaborator);
    }
    if let Some(location) = args.location {
        draft.location = location;
    }
    if let Some(day) = args.day {
        draft.date = parse_day(&day)?;
    }
    if let Some(start) = args.start {
        draft.start_time = parse_clock(&start)?;
    }
    if let Some(end) = args.end {
        draft.end_time = parse_clock(&end)?;
    }
    Ok(())
}

/// Walk through every field, keeping the current value on enter.
pub fn prompt_all(draft: &mut MeetingDraft, names: &[String]) -> Result<()> {
    draft.title = text("Title", Some(&draft.title))?;
    draft.client = text("Client", Some(&draft.client))?;
    draft.executive = pick_name("Executive", names, Some(&draft.executive))?;
    draft.collaborator = pick_optional_name("Collaborator", names, draft.collaborator.as_deref())?;
    draft.location = pick_location(Some(draft.location))?;
    draft.date = parsed("Date (YYYY-MM-DD)", Some(draft.date.to_string()), parse_day)?;
    draft.start_time = parsed(
        "Start (HH:MM)",
        Some(draft.start_time.format("%H:%M").to_string()),
        parse_clock,
    )?;
    draft.end_time = parsed(
        "End (HH:MM)",
        Some(draft.end_time.format("%H:%M").to_string()),
        parse_clock,
    )?;
    Ok(())
}

/// Print the result of a saved change.
pub fn report(outcome: RefreshOutcome, message: &str) {
    println!("{}", message.green());
    if outcome == RefreshOutcome::Stale {
        println!(
            "{}",
            "The meeting list could not be reloaded; run `agenda week` to see it.".yellow()
        );
    }
}
