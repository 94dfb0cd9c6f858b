use anyhow::Result;

use super::Context;
use crate::WindowArgs;
use crate::render::render_details;

pub async fn run(id: &str, window: WindowArgs) -> Result<()> {
    let ctx = Context::load()?;
    let (_, meeting) = ctx.load_meeting(id, &window).await?;

    println!("{}", render_details(&meeting));
    Ok(())
}
