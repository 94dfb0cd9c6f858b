use agenda_core::admin::{NewUser, UserAdmin, UserUpdate};
use agenda_core::constants::MIN_PASSWORD_LEN;
use agenda_core::repository::RefreshOutcome;
use agenda_core::user::Role;
use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use super::{Context, form};
use crate::render::Render;
use crate::utils::tui::with_spinner;

async fn admin() -> Result<UserAdmin> {
    let ctx = Context::load()?;
    ctx.require_login().await?;

    let mut admin = UserAdmin::new(ctx.gateway.clone());
    with_spinner("Loading users", admin.refresh()).await?;
    Ok(admin)
}

fn print_users(admin: &UserAdmin) {
    if admin.users().is_empty() {
        println!("{}", "No users.".dimmed());
        return;
    }
    for user in admin.users() {
        println!("{}", user.render());
    }
}

fn report(outcome: RefreshOutcome, message: &str) {
    println!("{}", message.green());
    if outcome == RefreshOutcome::Stale {
        println!(
            "{}",
            "The user list could not be reloaded; run `agenda users list` to see it.".yellow()
        );
    }
}

fn prompt_password() -> Result<String> {
    loop {
        let password = rpassword::prompt_password(format!(
            "  Password (min {MIN_PASSWORD_LEN} characters): "
        ))?;
        let again = rpassword::prompt_password("  Repeat password: ")?;
        if password == again {
            return Ok(password);
        }
        eprintln!("  {}", "Passwords do not match".red());
    }
}

pub async fn list() -> Result<()> {
    let admin = admin().await?;
    print_users(&admin);
    Ok(())
}

pub async fn add(name: Option<String>, email: Option<String>, role: Role) -> Result<()> {
    let mut admin = admin().await?;

    let name = match name {
        Some(n) => n,
        None => form::text("Name", None)?,
    };
    let email = match email {
        Some(e) => e,
        None => form::text("Email", None)?,
    };
    let password = prompt_password()?;

    let user = NewUser {
        name,
        email,
        password,
        role,
    };
    let email = user.email.trim().to_string();
    let outcome = with_spinner("Creating user", admin.create(user)).await?;

    report(outcome, &format!("Created user {email}"));
    if outcome == RefreshOutcome::Applied {
        print_users(&admin);
    }
    Ok(())
}

pub async fn edit(
    id: i64,
    name: Option<String>,
    email: Option<String>,
    role: Option<Role>,
    change_password: bool,
) -> Result<()> {
    let mut admin = admin().await?;
    if admin.find(id).is_none() {
        anyhow::bail!("No user with id {id}.");
    }

    let password = if change_password {
        Some(prompt_password()?)
    } else {
        None
    };

    let update = UserUpdate {
        name,
        email,
        password,
        role,
    };
    let outcome = with_spinner("Saving user", admin.update(id, update)).await?;

    report(outcome, &format!("Updated user {id}"));
    if outcome == RefreshOutcome::Applied {
        if let Some(user) = admin.find(id) {
            println!("{}", user.render());
        }
    }
    Ok(())
}

pub async fn delete(id: i64, yes: bool) -> Result<()> {
    let mut admin = admin().await?;
    let Some(user) = admin.find(id).cloned() else {
        anyhow::bail!("No user with id {id}.");
    };

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} <{}>?", user.name, user.email))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Nothing deleted.".dimmed());
            return Ok(());
        }
    }

    let outcome = with_spinner("Deleting user", admin.delete(id)).await?;
    report(outcome, &format!("Deleted user {}", user.email));
    Ok(())
}
