use agenda_core::meeting::MeetingDraft;
use anyhow::Result;

use super::{Context, form};
use crate::utils::tui::with_spinner;
use crate::{MeetingArgs, WindowArgs};

pub async fn run(id: &str, window: WindowArgs, args: MeetingArgs) -> Result<()> {
    let ctx = Context::load()?;
    let (repo, meeting) = ctx.load_meeting(id, &window).await?;

    let mut draft = MeetingDraft::from_meeting(&meeting);
    if args.is_empty() {
        form::prompt_all(&mut draft, &repo.executive_names())?;
        println!();
    } else {
        form::apply_args(&mut draft, args)?;
    }

    let outcome = with_spinner("Saving meeting", repo.update(id, &draft)).await?;
    form::report(outcome, &format!("Updated: {}", draft.title.trim()));
    Ok(())
}
