use chrono::{Datelike, Days, NaiveDate};

pub const DAYS_IN_WEEK: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl WeekWindow {
    pub fn containing(date: NaiveDate) -> Self {
        let days_from_sunday = date.weekday().num_days_from_sunday() as u64;
        let start = date
            .checked_sub_days(Days::new(days_from_sunday))
            .unwrap_or(date);
        let end = start
            .checked_add_days(Days::new(DAYS_IN_WEEK as u64 - 1))
            .unwrap_or(start);
        Self { start, end }
    }

    pub fn from_days(days: &[NaiveDate]) -> Option<Self> {
        if days.len() != DAYS_IN_WEEK {
            return None;
        }
        Some(Self {
            start: days[0],
            end: days[DAYS_IN_WEEK - 1],
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|day| *day <= self.end)
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }
}

pub fn shift_weeks(date: NaiveDate, weeks: i64) -> NaiveDate {
    let days = Days::new(weeks.unsigned_abs().saturating_mul(DAYS_IN_WEEK as u64));
    let shifted = if weeks >= 0 {
        date.checked_add_days(days)
    } else {
        date.checked_sub_days(days)
    };
    shifted.unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use proptest::prelude::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn thursday_window_crosses_month_boundary() {
        let window = WeekWindow::containing(date(2025, 10, 30));

        assert_eq!(window.start(), date(2025, 10, 26));
        assert_eq!(window.end(), date(2025, 11, 1));
    }

    #[test]
    fn sunday_is_its_own_week_start() {
        let window = WeekWindow::containing(date(2025, 10, 26));

        assert_eq!(window.start(), date(2025, 10, 26));
    }

    #[test]
    fn saturday_belongs_to_preceding_sunday() {
        let window = WeekWindow::containing(date(2025, 11, 1));

        assert_eq!(window.start(), date(2025, 10, 26));
    }

    #[test]
    fn window_rolls_over_year_boundary() {
        let window = WeekWindow::containing(date(2026, 1, 1));

        assert_eq!(window.start(), date(2025, 12, 28));
        assert_eq!(window.end(), date(2026, 1, 3));
    }

    #[test]
    fn from_days_accepts_computed_window() {
        let window = WeekWindow::containing(date(2025, 2, 27));

        assert_eq!(WeekWindow::from_days(&window.days()), Some(window));
    }

    #[test]
    fn from_days_rejects_six_days() {
        let mut days = WeekWindow::containing(date(2025, 2, 27)).days();
        days.pop();

        assert_eq!(WeekWindow::from_days(&days), None);
    }

    #[test]
    fn from_days_keeps_first_and_last_day_of_any_week() {
        let start = date(2025, 10, 27);
        let days: Vec<NaiveDate> = (0..7)
            .map(|offset| start.checked_add_days(Days::new(offset)).unwrap())
            .collect();

        let window = WeekWindow::from_days(&days).unwrap();

        assert_eq!(window.start(), date(2025, 10, 27));
        assert_eq!(window.end(), date(2025, 11, 2));
        assert_eq!(window.days(), days);
    }

    #[test]
    fn from_days_rejects_eight_days() {
        let mut days = WeekWindow::containing(date(2025, 2, 27)).days();
        days.push(date(2025, 3, 2));

        assert_eq!(WeekWindow::from_days(&days), None);
    }

    #[test]
    fn contains_checks_inclusive_bounds() {
        let window = WeekWindow::containing(date(2025, 10, 30));

        assert!(window.contains(date(2025, 10, 26)));
        assert!(window.contains(date(2025, 11, 1)));
        assert!(!window.contains(date(2025, 11, 2)));
        assert!(!window.contains(date(2025, 10, 25)));
    }

    #[test]
    fn shift_weeks_moves_seven_days_per_week() {
        assert_eq!(shift_weeks(date(2025, 10, 30), 1), date(2025, 11, 6));
        assert_eq!(shift_weeks(date(2025, 10, 30), -2), date(2025, 10, 16));
    }

    proptest! {
        #[test]
        fn window_is_seven_consecutive_days_from_sunday(offset in -200_000i64..200_000) {
            let reference = date(2000, 1, 1) + chrono::Duration::days(offset);
            let days = WeekWindow::containing(reference).days();

            prop_assert_eq!(days.len(), DAYS_IN_WEEK);
            prop_assert_eq!(days[0].weekday(), Weekday::Sun);
            for pair in days.windows(2) {
                prop_assert_eq!(pair[1] - pair[0], chrono::Duration::days(1));
            }
            prop_assert!(days.contains(&reference));
        }

        #[test]
        fn window_is_idempotent(offset in -200_000i64..200_000) {
            let reference = date(2000, 1, 1) + chrono::Duration::days(offset);
            let window = WeekWindow::containing(reference);

            prop_assert_eq!(WeekWindow::containing(window.start()), window);
            prop_assert_eq!(WeekWindow::containing(reference), window);
        }

        #[test]
        fn advancing_then_retreating_restores_window(offset in -200_000i64..200_000, weeks in 1i64..60) {
            let reference = date(2000, 1, 1) + chrono::Duration::days(offset);
            let there_and_back = shift_weeks(shift_weeks(reference, weeks), -weeks);
            let back_and_there = shift_weeks(shift_weeks(reference, -weeks), weeks);

            prop_assert_eq!(WeekWindow::containing(there_and_back), WeekWindow::containing(reference));
            prop_assert_eq!(WeekWindow::containing(back_and_there), WeekWindow::containing(reference));
        }
    }
}
