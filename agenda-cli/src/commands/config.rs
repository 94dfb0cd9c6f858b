use agenda_core::config::AgendaConfig;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let config_path = AgendaConfig::config_path()?;
    let session_path = AgendaConfig::session_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:   {}", config_path.display());
    println!("  Session:  {}", session_path.display());

    Ok(())
}
