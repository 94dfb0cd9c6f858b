use anyhow::Result;
use owo_colors::OwoColorize;

use super::Context;

pub async fn run() -> Result<()> {
    let ctx = Context::load()?;
    let user = ctx.require_login().await?;

    println!("{} <{}>", user.name.bold(), user.email);
    println!("  Role:     {}", user.role);
    println!("  Server:   {}", ctx.config.base_url);
    println!("  Timezone: {}", ctx.tz().name());

    Ok(())
}
