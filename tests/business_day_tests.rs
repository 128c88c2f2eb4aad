//! Unit tests for business-day counting and the exception-code policy
use chrono::NaiveDate;
use mygp_tracking::core::calendar::{
    business_days_diff, business_days_diff_with_holidays, HolidayProvider, HolidayTable, Layered,
    MexicanCalendar,
};
use mygp_tracking::core::policy::{does_date_kpi_break, should_put_exception_code};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[cfg(test)]
mod business_day_tests {
    use super::*;

    #[test]
    fn test_full_week_without_holidays_is_five() {
        assert_eq!(business_days_diff(ymd(2025, 7, 7), ymd(2025, 7, 14)), 5);
        // Starting on a Saturday
        assert_eq!(business_days_diff(ymd(2025, 7, 12), ymd(2025, 7, 19)), 5);
    }

    #[test]
    fn test_same_day_and_inverted_range_are_zero() {
        let d = ymd(2025, 7, 7);
        assert_eq!(business_days_diff(d, d), 0);
        assert_eq!(business_days_diff(ymd(2025, 7, 9), ymd(2025, 7, 7)), 0);
    }

    #[test]
    fn test_new_year_is_excluded() {
        let with_holiday = business_days_diff(ymd(2024, 12, 30), ymd(2025, 1, 6));
        let without_holiday = business_days_diff(ymd(2025, 7, 7), ymd(2025, 7, 14));
        assert_eq!(with_holiday + 1, without_holiday);
    }

    #[test]
    fn test_consecutive_weekdays() {
        assert_eq!(business_days_diff(ymd(2025, 7, 7), ymd(2025, 7, 8)), 1);
        assert_eq!(business_days_diff(ymd(2025, 7, 7), ymd(2025, 7, 9)), 2);
    }

    #[test]
    fn test_friday_to_monday_is_one() {
        assert_eq!(business_days_diff(ymd(2025, 7, 4), ymd(2025, 7, 7)), 1);
    }

    #[test]
    fn test_holy_week_is_excluded() {
        // Wed Apr 16 -> Mon Apr 21 2025: Thu/Fri are holidays
        assert_eq!(business_days_diff(ymd(2025, 4, 16), ymd(2025, 4, 21)), 1);
    }

    #[test]
    fn test_custom_table_replaces_statutory_calendar() {
        let table = HolidayTable::from_dates([ymd(2025, 7, 8)]);
        assert_eq!(
            business_days_diff_with_holidays(ymd(2025, 7, 7), ymd(2025, 7, 9), &table),
            1
        );
        // New Year is not in the custom table
        assert_eq!(
            business_days_diff_with_holidays(ymd(2024, 12, 31), ymd(2025, 1, 1), &table),
            1
        );
        assert_eq!(
            business_days_diff_with_holidays(ymd(2024, 12, 31), ymd(2025, 1, 1), &MexicanCalendar),
            0
        );
    }

    #[test]
    fn test_example_holiday_file_layers_over_rules() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/holidays.example.json");
        let table = HolidayTable::load(path).unwrap();
        assert_eq!(table.len(), 4);

        let calendar = Layered::new(MexicanCalendar, table);
        assert!(calendar.is_holiday(ymd(2025, 12, 12)));
        assert!(calendar.is_holiday(ymd(2025, 1, 1)));
        // Fri Dec 12 -> Mon Dec 15
        assert_eq!(
            business_days_diff_with_holidays(ymd(2025, 12, 11), ymd(2025, 12, 15), &calendar),
            1
        );
    }
}

#[cfg(test)]
mod exception_policy_tests {
    use super::*;

    #[test]
    fn test_should_put_exception_code_without_code_is_false() {
        assert!(!should_put_exception_code(
            None,
            Some("2025-07-07"),
            Some("2025-07-09")
        ));
    }

    #[test]
    fn test_kpi_break_without_code() {
        assert!(does_date_kpi_break(
            Some(""),
            Some("2025-07-07"),
            Some("2025-07-09"),
            1
        ));
    }

    #[test]
    fn test_kpi_within_threshold() {
        assert!(!does_date_kpi_break(
            None,
            Some("2025-07-07"),
            Some("2025-07-08"),
            1
        ));
        assert!(!does_date_kpi_break(
            None,
            Some("2025-07-07"),
            Some("2025-07-09"),
            2
        ));
    }

    #[test]
    fn test_code_present_suppresses_kpi_break() {
        assert!(!does_date_kpi_break(
            Some("E07"),
            Some("2025-07-07"),
            Some("2025-07-21"),
            1
        ));
    }

    #[test]
    fn test_missing_dates_never_block() {
        assert!(!does_date_kpi_break(None, None, Some("2025-07-09"), 1));
        assert!(!does_date_kpi_break(None, Some("2025-07-07"), None, 1));
        assert!(!should_put_exception_code(Some("E01"), None, None));
    }

    #[test]
    fn test_timestamps_use_calendar_date() {
        assert!(should_put_exception_code(
            Some("E01"),
            Some("2025-07-07T18:45:00"),
            Some("2025-07-08T09:00:00")
        ));
    }
}
