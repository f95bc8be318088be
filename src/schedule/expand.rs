//! Schedule expansion.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::Result;

use super::{DaySchedule, ScheduleEntry, TimeWindow};

/// Evaluate schedule entries into concrete day-by-day working windows over
/// `[from, to]`, both ends inclusive.
///
/// RRULEs without a `DTSTART` are anchored at `from` before expansion (they
/// model unbounded recurrence); bounded rules keep their own anchor. Entries
/// with `override` replace all windows accumulated so far for each matching
/// day. Bare entries (no rrule) contribute nothing. The result is sorted by
/// date with each day's windows sorted by start time.
pub fn expand_schedules(
    entries: &[ScheduleEntry],
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DaySchedule>> {
    let mut day_map: BTreeMap<NaiveDate, Vec<TimeWindow>> = BTreeMap::new();

    for entry in entries {
        let schedule = entry.to_schedule()?;

        let Some(rule) = schedule.rrule else {
            continue;
        };

        for date in rule.between(from, to) {
            if entry.override_windows {
                day_map.insert(date, schedule.ranges.clone());
            } else {
                day_map.entry(date).or_default().extend(schedule.ranges.iter().copied());
            }
        }
    }

    Ok(day_map
        .into_iter()
        .map(|(date, mut windows)| {
            windows.sort_by_key(|w| w.from);
            DaySchedule { date, windows }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{default_schedules, TimeRange};
    use chrono::Datelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(from: &str, to: &str, rrule: &str) -> ScheduleEntry {
        ScheduleEntry {
            ranges: vec![TimeRange { from: from.into(), to: to.into() }],
            rrule: rrule.into(),
            override_windows: false,
        }
    }

    #[test]
    fn default_schedule_february_2026() {
        let days =
            expand_schedules(&default_schedules(), date(2026, 2, 1), date(2026, 2, 28)).unwrap();
        assert_eq!(days.len(), 20, "February 2026 has 20 weekdays");
        for day in &days {
            assert!(day.date.weekday().num_days_from_monday() < 5);
            assert_eq!(day.windows.len(), 1);
            assert_eq!(day.scheduled_minutes(), 480);
        }
        // Sorted ascending.
        for pair in days.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn override_replaces_only_matching_days() {
        let mut monday_override = entry("10:00", "14:00", "RRULE:FREQ=WEEKLY;BYDAY=MO");
        monday_override.override_windows = true;

        let entries = vec![
            entry("09:00", "17:00", "RRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR"),
            monday_override,
        ];

        let days = expand_schedules(&entries, date(2026, 2, 2), date(2026, 2, 6)).unwrap();
        assert_eq!(days.len(), 5);

        let monday = &days[0];
        assert_eq!(monday.date, date(2026, 2, 2));
        assert_eq!(monday.scheduled_minutes(), 240);

        let tuesday = &days[1];
        assert_eq!(tuesday.scheduled_minutes(), 480);
    }

    #[test]
    fn non_override_appends_windows() {
        let entries = vec![
            entry("09:00", "12:00", "RRULE:FREQ=DAILY"),
            entry("13:00", "17:00", "RRULE:FREQ=DAILY"),
        ];
        let days = expand_schedules(&entries, date(2026, 2, 2), date(2026, 2, 2)).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].windows.len(), 2);
        assert!(days[0].windows[0].from < days[0].windows[1].from);
        assert_eq!(days[0].scheduled_minutes(), 420);
    }

    #[test]
    fn bare_entry_contributes_nothing() {
        let entries = vec![entry("09:00", "17:00", "")];
        let days = expand_schedules(&entries, date(2026, 2, 1), date(2026, 2, 28)).unwrap();
        assert!(days.is_empty());
    }

    #[test]
    fn single_date_entry() {
        let entries = vec![entry(
            "08:00",
            "12:00",
            "DTSTART:20260215T000000Z\nRRULE:FREQ=DAILY;COUNT=1",
        )];
        let days = expand_schedules(&entries, date(2026, 2, 1), date(2026, 2, 28)).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, date(2026, 2, 15));
    }
}
