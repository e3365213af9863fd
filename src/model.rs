use crate::time_range::{ClockTime, TimeRange};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour ShiftTemplate
    TemplateId
);
string_id!(
    /// Identifiant fort pour Driver
    DriverId
);
string_id!(
    /// Identifiant fort pour BookedShift
    BookingId
);

pub const MIN_TEMPLATE_CAPACITY: u8 = 1;
pub const MAX_CAPACITY: u8 = 20;

/// Marché (région), identifié par un code court (`avl`, `tto`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub code: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Créneau récurrent d'un marché.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTemplate {
    pub id: TemplateId,
    pub market: String,
    pub start: ClockTime,
    pub end: ClockTime,
    pub capacity: u8,
}

impl ShiftTemplate {
    pub fn new<M: Into<String>>(market: M, start: ClockTime, end: ClockTime, capacity: u8) -> Self {
        Self {
            id: TemplateId::random(),
            market: market.into(),
            start,
            end,
            capacity,
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    /// Le créneau déborde sur le lendemain.
    pub fn wraps(&self) -> bool {
        self.range().wraps()
    }

    /// Début concret pour une date donnée.
    pub fn starts_at(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start.to_naive_time())
    }

    /// Fin concrète : lendemain si le créneau passe minuit.
    pub fn ends_at(&self, date: NaiveDate) -> NaiveDateTime {
        let end_date = if self.wraps() {
            date.succ_opt().unwrap_or(date)
        } else {
            date
        };
        end_date.and_time(self.end.to_naive_time())
    }
}

/// Exception de capacité pour un jour de semaine (0 = dimanche).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityOverride {
    pub template_id: TemplateId,
    pub day_of_week: u8,
    pub capacity: u8,
}

impl CapacityOverride {
    /// Valeur sentinelle : pas d'exception, la capacité du template s'applique.
    pub const CLEARED: u8 = 0;

    pub fn is_cleared(&self) -> bool {
        self.capacity == Self::CLEARED
    }
}

/// Jour de semaine d'une date calendaire, 0 = dimanche .. 6 = samedi.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Réservation d'un chauffeur sur une occurrence (template, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedShift {
    pub id: BookingId,
    pub driver_id: DriverId,
    pub template_id: TemplateId,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl BookedShift {
    pub fn is_instance(&self, driver: &DriverId, template: &TemplateId, date: NaiveDate) -> bool {
        &self.driver_id == driver && &self.template_id == template && self.date == date
    }
}

pub const DEFAULT_PRIORITY: u8 = 5;

/// Chauffeur. Priorité 1 (la plus haute) à 5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    pub market: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub blocked: bool,
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

impl Driver {
    pub fn new<N: Into<String>, M: Into<String>>(id: DriverId, name: N, market: M) -> Self {
        Self {
            id,
            name: name.into(),
            market: market.into(),
            priority: DEFAULT_PRIORITY,
            blocked: false,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}
