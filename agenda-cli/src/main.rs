mod commands;
mod render;
mod utils;

use std::process::ExitCode;

use agenda_core::filter::LocationFilter;
use agenda_core::location::Location;
use agenda_core::user::Role;
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agenda")]
#[command(about = "Browse and manage meetings on the agenda server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        email: Option<String>,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Show the two-week calendar
    Week {
        #[command(flatten)]
        window: WindowArgs,

        /// Show a single day instead of the ten-day grid
        #[arg(long)]
        day: bool,

        /// Move forward this many steps (weeks, or days with --day)
        #[arg(long, default_value_t = 0)]
        next: u32,

        /// Move back this many steps (weeks, or days with --day)
        #[arg(long, default_value_t = 0)]
        prev: u32,

        /// Only meetings of this executive (display name)
        #[arg(short, long)]
        executive: Option<String>,

        /// all, sala-wit, virtual or presencial
        #[arg(short, long, default_value = "all")]
        location: LocationFilter,
    },
    /// Show one meeting
    Show {
        id: String,

        #[command(flatten)]
        window: WindowArgs,
    },
    /// Schedule a meeting (prompts for anything not given)
    Add {
        #[command(flatten)]
        fields: MeetingArgs,
    },
    /// Edit a meeting (prompts when no field is given)
    Edit {
        id: String,

        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        fields: MeetingArgs,
    },
    /// Delete a meeting
    Delete {
        id: String,

        #[command(flatten)]
        window: WindowArgs,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Which window to load when looking a meeting up by id.
#[derive(Args, Clone, Default)]
pub struct WindowArgs {
    /// Any date inside the window (YYYY-MM-DD, default today)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Clone, Default)]
pub struct MeetingArgs {
    #[arg(short, long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub client: Option<String>,

    /// Executive display name
    #[arg(short, long)]
    pub executive: Option<String>,

    /// Collaborator display name (empty string clears it)
    #[arg(long)]
    pub collaborator: Option<String>,

    /// sala-wit, virtual or presencial
    #[arg(short, long)]
    pub location: Option<Location>,

    /// Meeting day (YYYY-MM-DD)
    #[arg(long = "on")]
    pub day: Option<String>,

    /// Start time (HH:MM)
    #[arg(short, long)]
    pub start: Option<String>,

    /// End time (HH:MM)
    #[arg(long)]
    pub end: Option<String>,
}

impl MeetingArgs {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.client.is_none()
            && self.executive.is_none()
            && self.collaborator.is_none()
            && self.location.is_none()
            && self.day.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }
}

#[derive(Subcommand)]
enum UsersCommand {
    /// List accounts
    List,
    /// Create an account
    Add {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// user or salaWit
        #[arg(short, long, default_value = "user")]
        role: Role,
    },
    /// Change an account; only the given fields are sent
    Edit {
        id: i64,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        role: Option<Role>,

        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },
    /// Delete an account
    Delete {
        id: i64,

        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the config and session file locations
    Path,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AGENDA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", render::error_message(&e).red());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Login { email, password } => commands::login::run(email, password).await,
        Commands::Logout => commands::logout::run(),
        Commands::Whoami => commands::whoami::run().await,
        Commands::Week {
            window,
            day,
            next,
            prev,
            executive,
            location,
        } => {
            let options = commands::week::WeekOptions {
                date: window.date,
                single_day: day,
                offset: i64::from(next) - i64::from(prev),
                executive,
                location,
            };
            commands::week::run(options).await
        }
        Commands::Show { id, window } => commands::show::run(&id, window).await,
        Commands::Add { fields } => commands::add::run(fields).await,
        Commands::Edit { id, window, fields } => commands::edit::run(&id, window, fields).await,
        Commands::Delete { id, window, yes } => commands::delete::run(&id, window, yes).await,
        Commands::Users { command } => match command {
            UsersCommand::List => commands::users::list().await,
            UsersCommand::Add { name, email, role } => commands::users::add(name, email, role).await,
            UsersCommand::Edit {
                id,
                name,
                email,
                role,
                password,
            } => commands::users::edit(id, name, email, role, password).await,
            UsersCommand::Delete { id, yes } => commands::users::delete(id, yes).await,
        },
        Commands::Config { command } => match command {
            ConfigCommand::Path => commands::config::run(),
        },
    }
}
