pub mod add;
pub mod config;
pub mod delete;
pub mod edit;
pub mod form;
pub mod login;
pub mod logout;
pub mod show;
pub mod users;
pub mod week;
pub mod whoami;

use agenda_core::calendar::{CalendarView, ViewMode};
use agenda_core::config::AgendaConfig;
use agenda_core::gateway::Gateway;
use agenda_core::meeting::{Meeting, parse_day};
use agenda_core::repository::MeetingRepository;
use agenda_core::session::{AuthState, FileSessionStorage, Session};
use agenda_core::user::User;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::WindowArgs;
use crate::utils::tui::with_spinner;

/// Config plus a gateway bound to the stored session.
pub struct Context {
    pub config: AgendaConfig,
    pub gateway: Gateway,
}

impl Context {
    pub fn load() -> Result<Self> {
        let config = AgendaConfig::load()?;
        let session = Session::open(FileSessionStorage::new(AgendaConfig::session_path()?));
        let gateway = Gateway::from_config(&config, session)?;
        Ok(Context { config, gateway })
    }

    pub fn session(&self) -> &Session {
        self.gateway.session()
    }

    pub fn tz(&self) -> Tz {
        self.config.tz()
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz()).date_naive()
    }

    /// Check the stored token with the server before doing anything else.
    pub async fn require_login(&self) -> Result<User> {
        match with_spinner("Checking session", self.gateway.restore()).await? {
            AuthState::Authenticated(user) => Ok(user),
            _ => anyhow::bail!("Not logged in.\n\nLog in with:\n  agenda login <email>"),
        }
    }

    pub fn repository(&self, view: CalendarView) -> MeetingRepository {
        MeetingRepository::new(self.gateway.clone(), self.tz(), view)
    }

    /// Two-week window containing `--date` (or today).
    pub fn window(&self, args: &WindowArgs) -> Result<CalendarView> {
        let date = match &args.date {
            Some(d) => parse_day(d)?,
            None => self.today(),
        };
        Ok(CalendarView::starting(date, ViewMode::MultiDay))
    }

    /// Log in, load the window and look up one meeting in it.
    pub async fn load_meeting(&self, id: &str, args: &WindowArgs) -> Result<(MeetingRepository, Meeting)> {
        self.require_login().await?;
        let repo = self.repository(self.window(args)?);
        with_spinner("Loading meetings", repo.refresh()).await?;

        let Some(meeting) = repo.find(id) else {
            let range = repo.view().range();
            anyhow::bail!(
                "Meeting {id} not found between {} and {}.\n\
                Pass --date to look in another window.",
                range.start,
                range.end
            );
        };
        Ok((repo, meeting))
    }
}
