use crate::cache::EntryCache;
use crate::holidays::{last_day_of_month, us_holidays};
use chrono::{Datelike, NaiveDate};

pub const WEEKS_SHOWN: usize = 6;
pub const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Which month is on screen and which day is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarState {
    pub today: NaiveDate,
    pub view_year: i32,
    pub view_month: u32,
    pub selected: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub is_today: bool,
    pub is_future: bool,
    pub is_selected: bool,
    pub holiday: Option<&'static str>,
    pub drinking: bool,
    pub gambling: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCell {
    Placeholder,
    Day(DayCell),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub label: String,
    pub weeks: Vec<[GridCell; 7]>,
}

impl MonthGrid {
    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.weeks.iter().flatten().filter_map(|cell| match cell {
            GridCell::Day(day) => Some(day),
            GridCell::Placeholder => None,
        })
    }
}

impl CalendarState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            view_year: today.year(),
            view_month: today.month(),
            selected: None,
        }
    }

    /// Moves the view to `month` (1-based) of `year`. Out-of-range months roll
    /// over into neighbouring years; months after today's are clamped.
    pub fn set_view(&mut self, year: i32, month: i32) {
        let total = year * 12 + (month - 1);
        let current = self.today.year() * 12 + self.today.month0() as i32;
        let total = total.min(current);
        self.view_year = total.div_euclid(12);
        self.view_month = total.rem_euclid(12) as u32 + 1;
    }

    pub fn change_month(&mut self, delta: i32) {
        self.set_view(self.view_year, self.view_month as i32 + delta);
    }

    /// False while the month containing today is on screen. Later months are
    /// never in view, see `set_view`.
    pub fn can_go_next(&self) -> bool {
        !self.is_current_month()
    }

    pub fn is_current_month(&self) -> bool {
        (self.view_year, self.view_month) == (self.today.year(), self.today.month())
    }

    /// Selects `date` and brings its month into view. Future dates are refused.
    pub fn select(&mut self, date: NaiveDate) -> bool {
        if date > self.today {
            return false;
        }
        self.selected = Some(date);
        self.set_view(date.year(), date.month() as i32);
        true
    }

    pub fn first_of_month(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.view_year, self.view_month, 1).unwrap_or(self.today)
    }

    pub fn month_label(&self) -> String {
        format!("{} {}", month_name(self.view_month), self.view_year)
    }

    /// `YYYY-MM` key of the month `delta` months away from the view.
    pub fn month_key(&self, delta: i32) -> String {
        let total = self.view_year * 12 + self.view_month as i32 - 1 + delta;
        format!("{:04}-{:02}", total.div_euclid(12), total.rem_euclid(12) + 1)
    }

    pub fn month_grid(&self, cache: &EntryCache) -> MonthGrid {
        let first = self.first_of_month();
        let last = last_day_of_month(self.view_year, self.view_month).unwrap_or(first);
        let holidays = us_holidays(self.view_year);
        let leading = first.weekday().num_days_from_sunday() as usize;

        let mut cells = Vec::with_capacity(WEEKS_SHOWN * 7);
        cells.extend(std::iter::repeat_n(GridCell::Placeholder, leading));
        for date in first.iter_days().take_while(|date| *date <= last) {
            let entry = cache.get(date);
            cells.push(GridCell::Day(DayCell {
                date,
                day: date.day(),
                is_today: date == self.today,
                is_future: date > self.today,
                is_selected: self.selected == Some(date),
                holiday: holidays.get(&date).copied(),
                drinking: entry.drinking.is_some(),
                gambling: entry.gambling.is_some(),
            }));
        }
        cells.resize(WEEKS_SHOWN * 7, GridCell::Placeholder);

        let mut weeks = Vec::with_capacity(WEEKS_SHOWN);
        let mut iter = cells.into_iter();
        for _ in 0..WEEKS_SHOWN {
            let week: [GridCell; 7] = std::array::from_fn(|_| iter.next().unwrap_or(GridCell::Placeholder));
            weeks.push(week);
        }

        MonthGrid {
            label: self.month_label(),
            weeks,
        }
    }
}

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown")
}

/// e.g. `Friday, October 16, 2026`.
pub fn readable(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn parse_month_key(value: &str) -> Option<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d").ok()?;
    Some((date.year(), date.month()))
}
