use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use super::{Context, form};
use crate::WindowArgs;
use crate::render::Render;
use crate::utils::tui::with_spinner;

pub async fn run(id: &str, window: WindowArgs, yes: bool) -> Result<()> {
    let ctx = Context::load()?;
    let (repo, meeting) = ctx.load_meeting(id, &window).await?;

    if !yes {
        println!("   {}", meeting.render());
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete '{}'?", meeting.title))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Nothing deleted.".dimmed());
            return Ok(());
        }
    }

    let outcome = with_spinner("Deleting meeting", repo.delete(id)).await?;
    form::report(outcome, &format!("Deleted: {}", meeting.title));
    Ok(())
}
