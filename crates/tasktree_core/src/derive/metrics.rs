//! Presentation-ready metrics derived from entity snapshots.
//!
//! # Invariants
//! - `days_left` compares UTC calendar days, never raw timestamps.
//! - `progress_percent` is 0 for an empty denominator and never exceeds 100.

use crate::model::project::Project;
use crate::model::task::Task;
use crate::model::todo::Todo;
use chrono::{DateTime, NaiveDate, Utc};

/// Deadline window used by task cards for "due soon" hints.
pub const TASK_DEADLINE_WINDOW_DAYS: i64 = 3;
/// Deadline window used by project cards for "due soon" hints.
pub const PROJECT_DEADLINE_WINDOW_DAYS: i64 = 7;

/// Anything with a deadline and a completion notion.
pub trait Deadline {
    /// Due date (`eta` for projects).
    fn deadline(&self) -> DateTime<Utc>;
    /// Completion as defined per entity type.
    fn is_done(&self) -> bool;
}

impl Deadline for Project {
    fn deadline(&self) -> DateTime<Utc> {
        self.eta
    }

    fn is_done(&self) -> bool {
        self.is_completed()
    }
}

impl Deadline for Task {
    fn deadline(&self) -> DateTime<Utc> {
        self.due_date
    }

    fn is_done(&self) -> bool {
        self.completed
    }
}

impl Deadline for Todo {
    fn deadline(&self) -> DateTime<Utc> {
        self.due_date
    }

    fn is_done(&self) -> bool {
        self.completed
    }
}

/// Current UTC calendar day.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Whole days from `today` to the due day; negative once past.
pub fn days_left(due: DateTime<Utc>, today: NaiveDate) -> i64 {
    (due.date_naive() - today).num_days()
}

/// Past due (strictly before today) and not completed.
pub fn is_overdue(due: DateTime<Utc>, completed: bool, today: NaiveDate) -> bool {
    !completed && days_left(due, today) < 0
}

/// `days_left` for any entity with a deadline.
pub fn days_left_for<T: Deadline + ?Sized>(item: &T, today: NaiveDate) -> i64 {
    days_left(item.deadline(), today)
}

/// `is_overdue` for any entity with a deadline.
pub fn is_overdue_for<T: Deadline + ?Sized>(item: &T, today: NaiveDate) -> bool {
    is_overdue(item.deadline(), item.is_done(), today)
}

/// Integer completion percentage, rounded half up.
///
/// Returns 0 when `total == 0`; `completed` above `total` is clamped.
pub fn progress_percent(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    ((completed * 200 + total) / (total * 2)) as u32
}

/// Formats minutes as `Xm`, `Xh` or `Xh Ym`.
pub fn format_minutes(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {rest}m")
    }
}

/// Short "due soon" label for open items inside `window_days`.
///
/// Returns `None` for completed or overdue items and for deadlines beyond
/// the window.
pub fn deadline_hint(days_left: i64, completed: bool, window_days: i64) -> Option<String> {
    if completed || days_left < 0 || days_left > window_days {
        return None;
    }
    if days_left == 0 {
        Some("Today".to_string())
    } else {
        Some(format!("{days_left}d left"))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        days_left, deadline_hint, format_minutes, is_overdue, is_overdue_for, progress_percent,
    };
    use crate::model::common::ProjectStatus;
    use crate::model::project::Project;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn progress_is_zero_for_empty_and_rounds_half_up() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(1, 2), 50);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(1, 200), 1);
        assert_eq!(progress_percent(5, 4), 100);
    }

    #[test]
    fn progress_matches_rounded_ratio_over_grid() {
        for total in (1..=10_000u32).step_by(97) {
            for completed in (0..=total).step_by(13) {
                let exact = f64::from(completed) * 100.0 / f64::from(total);
                let got = f64::from(progress_percent(completed, total));
                assert!((got - exact).abs() <= 0.5 + 1e-9, "{completed}/{total}");
            }
            assert_eq!(progress_percent(total, total), 100);
            assert_eq!(progress_percent(0, total), 0);
        }
    }

    #[test]
    fn format_minutes_examples() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(59), "59m");
        assert_eq!(format_minutes(60), "1h");
        assert_eq!(format_minutes(90), "1h 30m");
        assert_eq!(format_minutes(600), "10h");
    }

    #[test]
    fn overdue_flips_after_the_due_day() {
        let due = Utc.with_ymd_and_hms(2026, 10, 17, 23, 59, 0).unwrap();
        assert_eq!(days_left(due, day(2026, 10, 17)), 0);
        assert!(!is_overdue(due, false, day(2026, 10, 17)));
        assert_eq!(days_left(due, day(2026, 10, 18)), -1);
        assert!(is_overdue(due, false, day(2026, 10, 18)));
        assert!(!is_overdue(due, true, day(2026, 10, 18)));
    }

    #[test]
    fn time_of_day_does_not_shift_the_boundary() {
        let today = day(2026, 10, 18);
        let early = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 1).unwrap();
        assert_eq!(days_left(early, today), 0);
        assert_eq!(days_left(early + Duration::days(2), today), 2);
    }

    #[test]
    fn project_completion_comes_from_status() {
        let eta = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let mut project = Project::new("p1", "Old", eta);
        assert!(is_overdue_for(&project, day(2026, 10, 18)));
        project.status = ProjectStatus::Completed;
        assert!(!is_overdue_for(&project, day(2026, 10, 18)));
        project.status = ProjectStatus::OnHold;
        assert!(is_overdue_for(&project, day(2026, 10, 18)));
    }

    #[test]
    fn deadline_hint_covers_window_only() {
        assert_eq!(deadline_hint(0, false, 3).as_deref(), Some("Today"));
        assert_eq!(deadline_hint(2, false, 3).as_deref(), Some("2d left"));
        assert_eq!(deadline_hint(4, false, 3), None);
        assert_eq!(deadline_hint(-1, false, 3), None);
        assert_eq!(deadline_hint(1, true, 3), None);
    }
}
