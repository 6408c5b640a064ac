//! Bookable grid: event days, half-hour start times, and slot keys.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::AppError;

/// First bookable start time, in minutes after midnight (10:00).
pub const FIRST_SLOT_MINUTES: u32 = 10 * 60;
/// Last bookable start time, in minutes after midnight (17:30).
pub const LAST_SLOT_MINUTES: u32 = 17 * 60 + 30;
/// Distance between two consecutive start times.
pub const SLOT_STEP_MINUTES: u32 = 30;

/// One of the three event days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Day {
    /// Opening day.
    Friday,
    /// Second day.
    Saturday,
    /// Closing day.
    Sunday,
}

impl Day {
    /// All event days in chronological order.
    pub const ALL: [Day; 3] = [Day::Friday, Day::Saturday, Day::Sunday];

    /// Calendar weekday of this event day.
    #[must_use]
    pub fn weekday(self) -> Weekday {
        match self {
            Self::Friday => Weekday::Fri,
            Self::Saturday => Weekday::Sat,
            Self::Sunday => Weekday::Sun,
        }
    }

    /// Lower-case tag used in store keys and API payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl Display for Day {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "friday" => Ok(Self::Friday),
            "saturday" => Ok(Self::Saturday),
            "sunday" => Ok(Self::Sunday),
            other => Err(AppError::validation("day", format!("unknown day '{other}'"))),
        }
    }
}

/// A start time on the fixed half-hour grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime {
    minutes: u32,
}

impl SlotTime {
    /// Earliest bookable start time.
    pub const FIRST: SlotTime = SlotTime {
        minutes: FIRST_SLOT_MINUTES,
    };

    /// Build a slot time from hour and minute, validating against the grid.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when the time is outside the grid.
    pub fn new(hour: u32, minute: u32) -> Result<Self, AppError> {
        let minutes = hour * 60 + minute;
        if minute >= 60
            || minutes < FIRST_SLOT_MINUTES
            || minutes > LAST_SLOT_MINUTES
            || minutes % SLOT_STEP_MINUTES != 0
        {
            return Err(AppError::validation(
                "time",
                format!("{hour:02}:{minute:02} is not a bookable start time"),
            ));
        }
        Ok(Self { minutes })
    }

    /// Every bookable start time of one day.
    #[must_use]
    pub fn grid() -> Vec<SlotTime> {
        (FIRST_SLOT_MINUTES..=LAST_SLOT_MINUTES)
            .step_by(SLOT_STEP_MINUTES as usize)
            .map(|minutes| SlotTime { minutes })
            .collect()
    }

    /// Hour component.
    #[must_use]
    pub fn hour(self) -> u32 {
        self.minutes / 60
    }

    /// Minute component.
    #[must_use]
    pub fn minute(self) -> u32 {
        self.minutes % 60
    }

    /// Wall-clock time of day.
    #[must_use]
    pub fn naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl Display for SlotTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for SlotTime {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::validation("time", format!("'{s}' is not in HH:MM format"));
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for SlotTime {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.to_string()
    }
}

/// Composite key of one slot occurrence: day tag, start time, and date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    /// Event day tag.
    pub day: Day,
    /// Start time on the grid.
    pub time: SlotTime,
    /// Calendar date of this occurrence.
    pub date: NaiveDate,
}

impl SlotKey {
    /// Store key holding the ordered appointment ids of this slot.
    #[must_use]
    pub fn store_key(&self) -> String {
        format!("slot:{}:{}:{}", self.day, self.time, self.date.format("%Y-%m-%d"))
    }
}

impl Display for SlotKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.day, self.time, self.date)
    }
}
