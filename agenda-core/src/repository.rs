//! Client-side meeting cache for the visible window.
//!
//! The cached list is only ever replaced wholesale by a fetch. Mutations go
//! to the server first and are followed by a full refetch; nothing is patched
//! locally. Each window or filter change bumps a generation counter so a slow
//! response for an old window can't overwrite a newer one.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::calendar::{CalendarView, Navigation, ViewMode};
use crate::error::{AgendaError, AgendaResult};
use crate::filter::{LocationFilter, MeetingFilter};
use crate::gateway::Gateway;
use crate::meeting::{Meeting, MeetingDraft, bucket_by_day};
use crate::resolve::{prepare_for_write, resolve};
use crate::user::{Role, UserDirectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched list replaced the cache.
    Applied,
    /// The window or filter changed while the fetch was in flight; the
    /// response was dropped.
    Superseded,
    /// The mutation succeeded but the follow-up fetch failed; the cache still
    /// holds the previous list.
    Stale,
}

struct RepoState {
    view: CalendarView,
    filter: MeetingFilter,
    users: UserDirectory,
    meetings: Vec<Meeting>,
}

pub struct MeetingRepository {
    gateway: Gateway,
    tz: Tz,
    state: RwLock<RepoState>,
    generation: AtomicU64,
}

impl MeetingRepository {
    pub fn new(gateway: Gateway, tz: Tz, view: CalendarView) -> Self {
        MeetingRepository {
            gateway,
            tz,
            state: RwLock::new(RepoState {
                view,
                filter: MeetingFilter::default(),
                users: UserDirectory::default(),
                meetings: Vec::new(),
            }),
            generation: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RepoState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RepoState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn view(&self) -> CalendarView {
        self.read().view
    }

    pub fn filter(&self) -> MeetingFilter {
        self.read().filter.clone()
    }

    fn role(&self) -> Option<Role> {
        self.gateway.session().role()
    }

    /// Location actually applied: the user's pick, or the room for
    /// room-bound accounts.
    pub fn effective_location(&self) -> LocationFilter {
        self.read().filter.effective_location(self.role())
    }

    pub fn users(&self) -> UserDirectory {
        self.read().users.clone()
    }

    /// Names for executive pickers. Falls back to the executives seen on the
    /// cached meetings when the user list could not be loaded.
    pub fn executive_names(&self) -> Vec<String> {
        let state = self.read();
        if !state.users.is_empty() {
            return state.users.names();
        }

        state
            .meetings
            .iter()
            .map(|m| m.executive.name.clone())
            .filter(|n| !n.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Everything the server returned for the window, before client filters.
    pub fn all_meetings(&self) -> Vec<Meeting> {
        self.read().meetings.clone()
    }

    /// Cached meetings after the executive/location filter.
    pub fn visible_meetings(&self) -> Vec<Meeting> {
        let role = self.role();
        let state = self.read();
        state.filter.apply(&state.meetings, role)
    }

    /// Visible days with their meetings, earliest first within each day.
    pub fn day_buckets(&self) -> Vec<(NaiveDate, Vec<Meeting>)> {
        let visible = self.visible_meetings();
        self.view()
            .days()
            .into_iter()
            .map(|day| {
                let meetings = bucket_by_day(&visible, day).into_iter().cloned().collect();
                (day, meetings)
            })
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<Meeting> {
        self.read().meetings.iter().find(|m| m.id == id).cloned()
    }

    /// Apply a state change that affects what the server must return, and
    /// invalidate any fetch already in flight.
    fn change_window(&self, change: impl FnOnce(&mut RepoState)) {
        let mut state = self.write();
        change(&mut state);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn navigate(&self, nav: Navigation, today: NaiveDate) -> AgendaResult<RefreshOutcome> {
        let mut view = self.view();
        view.navigate(nav, today)?;
        self.change_window(|s| s.view = view);
        self.refresh().await
    }

    /// Jump straight to an anchor date.
    pub async fn show(&self, anchor: NaiveDate) -> AgendaResult<RefreshOutcome> {
        self.change_window(|s| s.view = CalendarView::at(anchor, s.view.mode()));
        self.refresh().await
    }

    /// Switching between grid and single-day only changes which cached days
    /// are shown.
    pub fn set_mode(&self, mode: ViewMode) {
        self.write().view.set_mode(mode);
    }

    /// Executive filtering is client-side only.
    pub fn set_executive(&self, executive: Option<String>) {
        self.write().filter.executive = executive;
    }

    /// Location is also sent to the server, so changing it refetches.
    pub async fn set_location(&self, location: LocationFilter) -> AgendaResult<RefreshOutcome> {
        self.change_window(|s| s.filter.location = location);
        self.refresh().await
    }

    /// Reload the user directory. Failures other than auth keep the previous
    /// directory.
    pub async fn load_users(&self) -> AgendaResult<()> {
        match self.gateway.list_users().await {
            Ok(users) => {
                self.write().users = UserDirectory::new(users);
                Ok(())
            }
            Err(e) if e.is_auth_failure() => Err(e),
            Err(e) => {
                tracing::warn!("Could not load users, keeping previous list: {e}");
                Ok(())
            }
        }
    }

    /// Load users, then the meetings of the current window.
    pub async fn refresh(&self) -> AgendaResult<RefreshOutcome> {
        let generation = self.generation.load(Ordering::SeqCst);

        self.load_users().await?;

        let (range, location) = {
            let state = self.read();
            (
                state.view.range(),
                state.filter.effective_location(self.role()).location(),
            )
        };

        let raw = self
            .gateway
            .list_meetings(range.start_instant(self.tz), range.end_instant(self.tz), location)
            .await?;

        let mut guard = self.write();
        let state = &mut *guard;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(
                "Dropping meetings for {}..{}: window changed",
                range.start,
                range.end
            );
            return Ok(RefreshOutcome::Superseded);
        }

        state.meetings = raw.iter().map(|r| resolve(r, &state.users, self.tz)).collect();
        tracing::debug!(
            "Loaded {} meetings for {}..{}",
            state.meetings.len(),
            range.start,
            range.end
        );
        Ok(RefreshOutcome::Applied)
    }

    /// Refetch after a confirmed mutation. Only auth failures are errors here,
    /// since the server has already accepted the change.
    async fn resync(&self) -> AgendaResult<RefreshOutcome> {
        match self.refresh().await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_auth_failure() => Err(e),
            Err(e) => {
                tracing::warn!("Change saved but the list could not be reloaded: {e}");
                Ok(RefreshOutcome::Stale)
            }
        }
    }

    pub async fn create(&self, draft: &MeetingDraft) -> AgendaResult<RefreshOutcome> {
        if self.role().is_some_and(|r| r.is_room_bound()) {
            return Err(AgendaError::Validation(
                "Room accounts cannot create meetings".into(),
            ));
        }
        draft.validate()?;

        let payload = prepare_for_write(draft, &self.users(), self.tz)?;
        self.gateway.create_meeting(&payload).await?;
        tracing::info!("Created meeting '{}'", payload.title);

        self.resync().await
    }

    pub async fn update(&self, id: &str, draft: &MeetingDraft) -> AgendaResult<RefreshOutcome> {
        draft.validate()?;

        let payload = prepare_for_write(draft, &self.users(), self.tz)?;
        self.gateway.update_meeting(id, &payload).await?;
        tracing::info!("Updated meeting {id}");

        self.resync().await
    }

    /// Callers are expected to have confirmed with the user.
    pub async fn delete(&self, id: &str) -> AgendaResult<RefreshOutcome> {
        self.gateway.delete_meeting(id).await?;
        tracing::info!("Deleted meeting {id}");

        self.resync().await
    }
}
