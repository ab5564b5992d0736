use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::str::FromStr;

/// A daily time-of-day window. `end <= start` means the window crosses midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl FromStr for TimeWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .with_context(|| format!("Invalid window `{}`, expected HH:MM-HH:MM", s))?;
        let parse = |part: &str| {
            NaiveTime::parse_from_str(part.trim(), "%H:%M")
                .with_context(|| format!("Invalid time `{}` in window `{}`", part.trim(), s))
        };
        Ok(TimeWindow {
            start: parse(start)?,
            end: parse(end)?,
        })
    }
}

/// Start inclusive, end exclusive.
pub fn should_run_now(now: NaiveTime, window: &TimeWindow) -> bool {
    if window.start < window.end {
        now >= window.start && now < window.end
    } else {
        now >= window.start || now < window.end
    }
}

/// Daemon check: inside the window and not yet run on this calendar day.
///
/// For a window crossing midnight, the run "day" is the day the window opened,
/// so 23:30 and 00:30 of the following morning count as the same window.
pub fn is_due(now: NaiveDateTime, window: Option<&TimeWindow>, last_run: Option<NaiveDate>) -> bool {
    if let Some(w) = window {
        if !should_run_now(now.time(), w) {
            return false;
        }
    }
    let day = window_day(now, window);
    last_run.map_or(true, |ran| ran < day)
}

pub fn window_day(now: NaiveDateTime, window: Option<&TimeWindow>) -> NaiveDate {
    match window {
        Some(w) if w.start >= w.end && now.time() < w.end => {
            now.date().pred_opt().unwrap_or(now.date())
        }
        _ => now.date(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_window() {
        let window: TimeWindow = "01:00-05:30".parse().unwrap();
        assert_eq!(window.start, t(1, 0));
        assert_eq!(window.end, t(5, 30));
        assert!("0100-0500".parse::<TimeWindow>().is_err());
        assert!("01:00-99:00".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn test_same_day_window() {
        let window: TimeWindow = "01:00-05:00".parse().unwrap();
        assert!(should_run_now(t(1, 0), &window));
        assert!(should_run_now(t(4, 59), &window));
        assert!(!should_run_now(t(5, 0), &window));
        assert!(!should_run_now(t(0, 59), &window));
    }

    #[test]
    fn test_window_crossing_midnight() {
        let window: TimeWindow = "23:00-02:00".parse().unwrap();
        assert!(should_run_now(t(23, 30), &window));
        assert!(should_run_now(t(1, 0), &window));
        assert!(!should_run_now(t(2, 0), &window));
        assert!(!should_run_now(t(12, 0), &window));
    }

    #[test]
    fn test_is_due_once_per_day() {
        let window: TimeWindow = "01:00-05:00".parse().unwrap();
        let first = at(10, 1, 5);
        assert!(is_due(first, Some(&window), None));
        let ran = window_day(first, Some(&window));
        assert!(!is_due(at(10, 3, 0), Some(&window), Some(ran)));
        assert!(is_due(at(11, 1, 0), Some(&window), Some(ran)));
        assert!(!is_due(at(11, 6, 0), Some(&window), None));
    }

    #[test]
    fn test_is_due_midnight_window_counts_as_one_day() {
        let window: TimeWindow = "23:00-02:00".parse().unwrap();
        let evening = at(10, 23, 30);
        let ran = window_day(evening, Some(&window));
        assert!(!is_due(at(11, 0, 30), Some(&window), Some(ran)));
        assert!(is_due(at(11, 23, 10), Some(&window), Some(ran)));
    }

    #[test]
    fn test_is_due_without_window() {
        let now = at(10, 12, 0);
        assert!(is_due(now, None, None));
        assert!(!is_due(now, None, Some(now.date())));
    }
}
