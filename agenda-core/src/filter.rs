//! Executive and location filters applied on top of what the backend returns.

use std::fmt;
use std::str::FromStr;

use crate::location::Location;
use crate::meeting::Meeting;
use crate::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationFilter {
    #[default]
    All,
    Only(Location),
}

impl LocationFilter {
    pub fn location(&self) -> Option<Location> {
        match self {
            LocationFilter::All => None,
            LocationFilter::Only(l) => Some(*l),
        }
    }
}

impl fmt::Display for LocationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationFilter::All => f.write_str("all"),
            LocationFilter::Only(l) => f.write_str(l.as_str()),
        }
    }
}

impl FromStr for LocationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(LocationFilter::All)
        } else {
            s.parse().map(LocationFilter::Only)
        }
    }
}

/// What the user picked in the filter bar.
///
/// For room-bound accounts the location choice is ignored and the room is
/// used instead; that pinned value is computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeetingFilter {
    /// Executive display name; `None` means all executives.
    pub executive: Option<String>,
    pub location: LocationFilter,
}

impl MeetingFilter {
    pub fn effective_location(&self, role: Option<Role>) -> LocationFilter {
        if role.is_some_and(|r| r.is_room_bound()) {
            LocationFilter::Only(Location::SalaWit)
        } else {
            self.location
        }
    }

    pub fn matches(&self, meeting: &Meeting, role: Option<Role>) -> bool {
        if self
            .executive
            .as_ref()
            .is_some_and(|executive| meeting.executive.name != *executive)
        {
            return false;
        }

        match self.effective_location(role) {
            LocationFilter::All => true,
            LocationFilter::Only(location) => meeting.location == location,
        }
    }

    pub fn apply(&self, meetings: &[Meeting], role: Option<Role>) -> Vec<Meeting> {
        meetings
            .iter()
            .filter(|m| self.matches(m, role))
            .cloned()
            .collect()
    }
}
