//! Business-day arithmetic over the Mexican customs calendar.
//!
//! Saturdays, Sundays and the dates returned by a [`HolidayProvider`] are
//! non-business days. Providers are keyed by year so the calculator stays
//! correct outside any single hardcoded year.
use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Source of non-business dates, looked up one year at a time.
pub trait HolidayProvider: Send + Sync {
    /// All holidays falling in `year`.
    fn holidays_in(&self, year: i32) -> BTreeSet<NaiveDate>;

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays_in(date.year()).contains(&date)
    }
}

/// Statutory Mexican holidays computed from their calendar rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct MexicanCalendar;

impl HolidayProvider for MexicanCalendar {
    fn holidays_in(&self, year: i32) -> BTreeSet<NaiveDate> {
        let mut days = BTreeSet::new();

        let fixed = [(1, 1), (5, 1), (9, 16), (12, 25)];
        for (month, day) in fixed {
            days.extend(NaiveDate::from_ymd_opt(year, month, day));
        }

        // Constitution day, Benito Juárez's birthday, Revolution day
        days.extend(NaiveDate::from_weekday_of_month_opt(year, 2, Weekday::Mon, 1));
        days.extend(NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Mon, 3));
        days.extend(NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Mon, 3));

        // Executive power transmission, every six years since 2024
        if year >= 2024 && (year - 2024) % 6 == 0 {
            days.extend(NaiveDate::from_ymd_opt(year, 10, 1));
        }

        if let Some(easter) = easter_sunday(year) {
            days.insert(easter - Duration::days(3));
            days.insert(easter - Duration::days(2));
        }

        days
    }
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Explicit holiday lists keyed by year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayTable {
    by_year: HashMap<i32, BTreeSet<NaiveDate>>,
}

impl HolidayTable {
    pub fn from_dates<I>(dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut by_year: HashMap<i32, BTreeSet<NaiveDate>> = HashMap::new();
        for date in dates {
            by_year.entry(date.year()).or_default().insert(date);
        }
        Self { by_year }
    }

    /// Parses a table shaped like `{"2025": ["2025-01-01", ...]}`.
    ///
    /// Every date must belong to the year it is listed under.
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let parsed: BTreeMap<String, Vec<NaiveDate>> =
            serde_json::from_str(raw).context("holiday table must map years to ISO dates")?;

        let mut by_year: HashMap<i32, BTreeSet<NaiveDate>> = HashMap::new();
        for (key, dates) in parsed {
            let year: i32 = key
                .trim()
                .parse()
                .with_context(|| format!("invalid year key '{}'", key))?;
            for date in dates {
                if date.year() != year {
                    anyhow::bail!("holiday {} is listed under year {}", date, year);
                }
                by_year.entry(year).or_default().insert(date);
            }
        }

        Ok(Self { by_year })
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read holiday file {}", path.display()))?;
        let table = Self::from_json_str(&raw)
            .with_context(|| format!("failed to parse holiday file {}", path.display()))?;

        tracing::info!(
            "Loaded {} holiday(s) across {} year(s) from {}",
            table.len(),
            table.by_year.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.by_year.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HolidayProvider for HolidayTable {
    fn holidays_in(&self, year: i32) -> BTreeSet<NaiveDate> {
        self.by_year.get(&year).cloned().unwrap_or_default()
    }

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.by_year
            .get(&date.year())
            .is_some_and(|days| days.contains(&date))
    }
}

/// A base calendar with extra dates added on top.
pub struct Layered {
    base: Box<dyn HolidayProvider>,
    extra: HolidayTable,
}

impl Layered {
    pub fn new(base: impl HolidayProvider + 'static, extra: HolidayTable) -> Self {
        Self {
            base: Box::new(base),
            extra,
        }
    }
}

impl HolidayProvider for Layered {
    fn holidays_in(&self, year: i32) -> BTreeSet<NaiveDate> {
        let mut days = self.base.holidays_in(year);
        days.extend(self.extra.holidays_in(year));
        days
    }

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.extra.is_holiday(date) || self.base.is_holiday(date)
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Counts business days after `start` up to and including `end`.
///
/// Returns 0 when `end` is not after `start`. Whole weeks are counted
/// arithmetically, so the cost grows with the number of years spanned rather
/// than the number of days.
pub fn business_days_diff_with_holidays<H>(start: NaiveDate, end: NaiveDate, holidays: &H) -> u32
where
    H: HolidayProvider + ?Sized,
{
    let span = (end - start).num_days();
    if span <= 0 {
        return 0;
    }

    // Any seven consecutive days hold exactly five weekdays
    let weeks = span / 7;
    let mut count = weeks * 5;

    let mut day = start + Duration::days(weeks * 7);
    while day < end {
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
        if !is_weekend(day) {
            count += 1;
        }
    }

    let first_year = start.succ_opt().map_or(end.year(), |d| d.year());
    for year in first_year..=end.year() {
        let weekday_holidays = holidays
            .holidays_in(year)
            .into_iter()
            .filter(|h| *h > start && *h <= end && !is_weekend(*h))
            .count();
        count -= weekday_holidays as i64;
    }

    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

/// [`business_days_diff_with_holidays`] over the statutory Mexican calendar.
pub fn business_days_diff(start: NaiveDate, end: NaiveDate) -> u32 {
    business_days_diff_with_holidays(start, end, &MexicanCalendar)
}

/// Earliest year accepted from external input.
pub const MIN_CALENDAR_YEAR: i32 = 1900;
/// Latest year accepted from external input.
pub const MAX_CALENDAR_YEAR: i32 = 2200;

pub fn is_supported_year(year: i32) -> bool {
    (MIN_CALENDAR_YEAR..=MAX_CALENDAR_YEAR).contains(&year)
}

/// Reads the calendar date out of a date or date-time string.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DD[T ]HH:MM:SS`
/// forms; time of day is discarded. Returns `None` for anything else,
/// including dates outside `MIN_CALENDAR_YEAR..=MAX_CALENDAR_YEAR`.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.date_naive()))
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|ts| ts.date())
        })?;

    is_supported_year(date.year()).then_some(date)
}
