//! Week/day derivation for the perpetual two-week meal cycle.
//!
//! Plans alternate between week 1 and week 2 forever, anchored at the
//! plan's `start_date`. Everything here is pure: the clock is an explicit
//! argument, so callers pass `Utc::now()` and tests pass fixed instants.

use chrono::{DateTime, Datelike, Duration, Utc};

use mealtrack_db::models::DayOfWeek;

/// The slot a user is currently in: which week of the cycle and which day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentSlot {
    /// 1 or 2.
    pub week: i32,
    pub day: DayOfWeek,
}

/// Derive the current week and day from a plan's start date.
///
/// A missing start date defaults to 14 days before `now` (one full cycle
/// ago, which lands on week 1). A start date in the future clamps to
/// week 1: the cycle never reports week 2 for a plan that has not
/// started.
pub fn current_week_and_day(start_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> CurrentSlot {
    let start = start_date.unwrap_or(now - Duration::days(14));

    let days_since = (now - start).num_days();
    let week = if days_since < 0 {
        1
    } else {
        ((days_since / 7) % 2 + 1) as i32
    };

    CurrentSlot {
        week,
        day: DayOfWeek::from(now.weekday()),
    }
}

/// Encode a `(week, day)` slot as the composite key used to index the
/// nested day map, e.g. `"week1_Monday"`.
pub fn format_week_day(week: i32, day: DayOfWeek) -> String {
    format!("week{week}_{day}")
}

/// Decode a composite week-day key.
///
/// Keys that do not match the `week{1|2}_{Day}` pattern fall back to week
/// 1 with the raw key as the day, so data written before the two-week
/// migration still resolves.
pub fn parse_week_day(key: &str) -> (i32, String) {
    let parsed = key.strip_prefix("week").and_then(|rest| {
        let (week_str, day_str) = rest.split_once('_')?;
        let week: i32 = week_str.parse().ok()?;
        if (week == 1 || week == 2) && day_str.parse::<DayOfWeek>().is_ok() {
            Some((week, day_str.to_string()))
        } else {
            None
        }
    });
    parsed.unwrap_or_else(|| (1, key.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn week_day_key_roundtrip() {
        for week in [1, 2] {
            for day in DayOfWeek::ALL {
                let key = format_week_day(week, day);
                let (parsed_week, parsed_day) = parse_week_day(&key);
                assert_eq!(parsed_week, week);
                assert_eq!(parsed_day, day.to_string());
            }
        }
    }

    #[test]
    fn malformed_keys_fall_back_to_week_one() {
        for key in ["Monday", "week3_Monday", "week1_Someday", "week_", "", "w1_Monday"] {
            let (week, day) = parse_week_day(key);
            assert_eq!(week, 1, "key {key:?} should fall back to week 1");
            assert_eq!(day, key, "fallback keeps the raw key as the day");
        }
    }

    #[test]
    fn week_alternation_boundaries() {
        // 2026-06-01 is a Monday.
        let start = utc(2026, 6, 1);

        // Days 0..6 -> week 1.
        for offset in 0..7 {
            let slot = current_week_and_day(Some(start), start + Duration::days(offset));
            assert_eq!(slot.week, 1, "day {offset} should be week 1");
        }
        // Days 7..13 -> week 2.
        for offset in 7..14 {
            let slot = current_week_and_day(Some(start), start + Duration::days(offset));
            assert_eq!(slot.week, 2, "day {offset} should be week 2");
        }
        // Days 14..20 -> week 1 again.
        for offset in 14..21 {
            let slot = current_week_and_day(Some(start), start + Duration::days(offset));
            assert_eq!(slot.week, 1, "day {offset} should wrap to week 1");
        }
    }

    #[test]
    fn day_tracks_now_not_start() {
        let start = utc(2026, 6, 1); // Monday
        let now = utc(2026, 6, 4); // Thursday
        let slot = current_week_and_day(Some(start), now);
        assert_eq!(slot.day, DayOfWeek::Thursday);
        assert_eq!(slot.week, 1);
    }

    #[test]
    fn missing_start_defaults_to_week_one() {
        let now = utc(2026, 6, 10); // Wednesday
        let slot = current_week_and_day(None, now);
        assert_eq!(slot.week, 1, "14 days back is exactly one full cycle");
        assert_eq!(slot.day, DayOfWeek::Wednesday);
    }

    #[test]
    fn future_start_clamps_to_week_one() {
        let now = utc(2026, 6, 1);
        let start = utc(2026, 6, 20);
        let slot = current_week_and_day(Some(start), now);
        assert_eq!(slot.week, 1);
    }

    #[test]
    fn partial_days_floor() {
        // 6 days and 23 hours after start is still day 6, week 1.
        let start = utc(2026, 6, 1);
        let now = start + Duration::days(6) + Duration::hours(23);
        let slot = current_week_and_day(Some(start), now);
        assert_eq!(slot.week, 1);
    }
}
