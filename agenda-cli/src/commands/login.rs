use anyhow::Result;
use dialoguer::Input;
use owo_colors::OwoColorize;

use super::Context;
use crate::utils::tui::with_spinner;

pub async fn run(email: Option<String>, password: Option<String>) -> Result<()> {
    let ctx = Context::load()?;

    let email = match email {
        Some(e) => e,
        None => Input::<String>::new().with_prompt("  Email").interact_text()?,
    };
    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password("  Password: ")?,
    };

    let user = with_spinner("Logging in", ctx.gateway.login(&email, &password)).await?;

    println!(
        "{}",
        format!("Logged in as {} <{}>", user.name, user.email).green()
    );
    if user.role.is_room_bound() {
        println!("{}", "Room account: the calendar only shows Sala Wit.".dimmed());
    }

    Ok(())
}
