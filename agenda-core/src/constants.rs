/// Days covered by one fetch window (two calendar weeks, inclusive).
pub const WINDOW_DAYS: i64 = 14;

/// Weekdays shown in the multi-day grid (two five-day work weeks).
pub const VISIBLE_WORKDAYS: usize = 10;

/// Anchor shift for previous/next in the multi-day grid.
pub const WEEK_STEP_DAYS: i64 = 7;

/// Anchor shift for previous/next in single-day mode.
pub const DAY_STEP_DAYS: i64 = 1;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minimum password length accepted by the user admin forms.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Label used when a meeting carries no executive reference at all.
pub const NO_EXECUTIVE_LABEL: &str = "Sin ejecutivo";
