//! Heures murales "HH:MM" et plages horaires pouvant passer minuit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid time format {0:?}: expected 24-hour HH:MM")]
pub struct TimeFormatError(pub String);

/// Heure murale, stockée en minutes depuis minuit (`0..1440`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    pub fn from_hm(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self(u16::from(hour) * 60 + u16::from(minute)))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
    pub fn hour(self) -> u8 {
        (self.0 / 60) as u8
    }
    pub fn minute(self) -> u8 {
        (self.0 % 60) as u8
    }

    pub fn to_naive_time(self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(u32::from(self.hour()), u32::from(self.minute()), 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }

    /// Affichage 12 h : `9:00AM`, `12:30PM`, `12:00AM`.
    pub fn to_12h(self) -> String {
        let hour = self.hour();
        let suffix = if hour >= 12 { "PM" } else { "AM" };
        let display = match hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{display}:{:02}{suffix}", self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = TimeFormatError;

    /// Format strict `^([01]\d|2[0-3]):([0-5]\d)$`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeFormatError(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let digit = |b: u8| b.is_ascii_digit().then(|| b - b'0');
        let (Some(h1), Some(h2), Some(m1), Some(m2)) =
            (digit(bytes[0]), digit(bytes[1]), digit(bytes[3]), digit(bytes[4]))
        else {
            return Err(invalid());
        };
        Self::from_hm(h1 * 10 + h2, m1 * 10 + m2).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeFormatError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Convertit "HH:MM" en minutes depuis minuit.
pub fn to_minutes(time: &str) -> Result<u16, TimeFormatError> {
    time.parse::<ClockTime>().map(ClockTime::minutes)
}

/// Plage horaire `[start, end)`. `end < start` : la plage passe minuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    pub fn wraps(&self) -> bool {
        self.end < self.start
    }

    /// Bornes continues en minutes ; la fin d'une plage de nuit reçoit +1440.
    pub fn normalized(&self) -> (u32, u32) {
        let start = u32::from(self.start.minutes());
        let mut end = u32::from(self.end.minutes());
        if self.wraps() {
            end += u32::from(MINUTES_PER_DAY);
        }
        (start, end)
    }

    /// Test demi-ouvert sur le même jour calendaire : deux plages contiguës
    /// ne se chevauchent pas.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        let (a_start, a_end) = self.normalized();
        let (b_start, b_end) = other.normalized();
        a_start < b_end && a_end > b_start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Variante texte de [`TimeRange::overlaps`].
pub fn overlaps(
    start_a: &str,
    end_a: &str,
    start_b: &str,
    end_b: &str,
) -> Result<bool, TimeFormatError> {
    let a = TimeRange::new(start_a.parse()?, end_a.parse()?);
    let b = TimeRange::new(start_b.parse()?, end_b.parse()?);
    Ok(a.overlaps(&b))
}
