use anyhow::Result;
use owo_colors::OwoColorize;

use super::Context;

pub fn run() -> Result<()> {
    let ctx = Context::load()?;

    if ctx.session().token().is_none() {
        println!("{}", "Not logged in.".dimmed());
        return Ok(());
    }

    ctx.session().logout()?;
    println!("{}", "Logged out.".green());
    Ok(())
}
