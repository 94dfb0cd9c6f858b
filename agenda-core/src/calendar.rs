//! Calendar window: which days are shown, which span is fetched, and how the
//! anchor moves when navigating.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::constants::{DAY_STEP_DAYS, VISIBLE_WORKDAYS, WEEK_STEP_DAYS, WINDOW_DAYS};
use crate::error::{AgendaError, AgendaResult};

/// Monday of the ISO week containing `date`. Clamped to the earliest
/// representable date.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let weekday = date.weekday().number_from_monday() as i64; // Sunday = 7
    date.checked_sub_signed(Duration::days(weekday - 1))
        .unwrap_or(NaiveDate::MIN)
}

/// Inclusive two-week span sent to the backend as the fetch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub fn visible_range(anchor: NaiveDate) -> VisibleRange {
    VisibleRange {
        start: anchor,
        end: anchor
            .checked_add_signed(Duration::days(WINDOW_DAYS - 1))
            .unwrap_or(NaiveDate::MAX),
    }
}

impl VisibleRange {
    /// First instant of `start` in `tz`.
    pub fn start_instant(&self, tz: Tz) -> DateTime<Utc> {
        local_instant(tz, self.start.and_time(NaiveTime::MIN))
    }

    /// Last millisecond of `end` in `tz`.
    pub fn end_instant(&self, tz: Tz) -> DateTime<Utc> {
        let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        local_instant(tz, self.end.and_time(last))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Map a local wall-clock time to an instant, skipping forward over DST gaps.
fn local_instant(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            naive
                .checked_add_signed(Duration::hours(1))
                .and_then(|later| tz.from_local_datetime(&later).earliest())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Two five-day work weeks.
    #[default]
    MultiDay,
    /// Just the anchor day (narrow screens).
    SingleDay,
}

impl ViewMode {
    fn step_days(self) -> i64 {
        match self {
            ViewMode::MultiDay => WEEK_STEP_DAYS,
            ViewMode::SingleDay => DAY_STEP_DAYS,
        }
    }
}

fn is_workday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Days rendered by the calendar grid.
///
/// Multi-day mode walks forward from `anchor` and keeps Monday to Friday until
/// ten days are collected, so an anchor on a weekend starts on the next Monday.
pub fn visible_days(anchor: NaiveDate, mode: ViewMode) -> Vec<NaiveDate> {
    match mode {
        ViewMode::SingleDay => vec![anchor],
        ViewMode::MultiDay => anchor
            .iter_days()
            .filter(|d| is_workday(*d))
            .take(VISIBLE_WORKDAYS)
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Previous,
    Next,
    Today,
}

/// Anchor date plus view mode; everything else is derived from these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarView {
    anchor: NaiveDate,
    mode: ViewMode,
}

impl CalendarView {
    /// View anchored on the Monday of the week containing `today`.
    pub fn starting(today: NaiveDate, mode: ViewMode) -> Self {
        CalendarView {
            anchor: week_start(today),
            mode,
        }
    }

    /// View anchored exactly on `anchor`.
    pub fn at(anchor: NaiveDate, mode: ViewMode) -> Self {
        CalendarView { anchor, mode }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn navigate(&mut self, nav: Navigation, today: NaiveDate) -> AgendaResult<()> {
        match nav {
            Navigation::Previous => self.step(-1),
            Navigation::Next => self.step(1),
            Navigation::Today => {
                self.anchor = week_start(today);
                Ok(())
            }
        }
    }

    /// Move the anchor by `steps` weeks (or days in single-day mode);
    /// negative goes back. The anchor is unchanged on error.
    pub fn step(&mut self, steps: i64) -> AgendaResult<()> {
        self.anchor = steps
            .checked_mul(self.mode.step_days())
            .and_then(Duration::try_days)
            .and_then(|delta| self.anchor.checked_add_signed(delta))
            .ok_or_else(|| AgendaError::Validation("Date is out of range".into()))?;
        Ok(())
    }

    pub fn range(&self) -> VisibleRange {
        visible_range(self.anchor)
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        visible_days(self.anchor, self.mode)
    }
}
