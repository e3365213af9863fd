//! Réglages de planification et politique de réservation.
//!
//! - `SchedulingSettings` : singleton modifiable par un admin, persisté avec le ledger.
//! - `BookingPolicy` : table des bonus de priorité, nommée plutôt qu'en dur.
//! - `ZonePolicy` : fuseau unique dans lequel "aujourd'hui" et "maintenant" sont évalués.

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

pub const BASE_SCHEDULE_DAYS_RANGE: RangeInclusive<u32> = 1..=30;
pub const CANCEL_HOURS_RANGE: RangeInclusive<u32> = 1..=72;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("baseScheduleDays must be 1-30 (got {0})")]
    BaseScheduleDays(u32),
    #[error("cancelHoursBefore must be 1-72 (got {0})")]
    CancelHoursBefore(u32),
    #[error("unknown time zone: {0}")]
    UnknownZone(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingSettings {
    base_schedule_days: u32,
    cancel_hours_before: u32,
    #[serde(default = "default_show_spots")]
    show_available_spots: bool,
}

fn default_show_spots() -> bool {
    true
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            base_schedule_days: 7,
            cancel_hours_before: 24,
            show_available_spots: true,
        }
    }
}

impl SchedulingSettings {
    pub fn new(base_schedule_days: u32, cancel_hours_before: u32) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        settings.set_base_schedule_days(base_schedule_days)?;
        settings.set_cancel_hours_before(cancel_hours_before)?;
        Ok(settings)
    }

    pub fn base_schedule_days(&self) -> u32 {
        self.base_schedule_days
    }
    pub fn cancel_hours_before(&self) -> u32 {
        self.cancel_hours_before
    }
    pub fn show_available_spots(&self) -> bool {
        self.show_available_spots
    }

    pub fn set_base_schedule_days(&mut self, days: u32) -> Result<(), SettingsError> {
        if !BASE_SCHEDULE_DAYS_RANGE.contains(&days) {
            return Err(SettingsError::BaseScheduleDays(days));
        }
        self.base_schedule_days = days;
        Ok(())
    }

    pub fn set_cancel_hours_before(&mut self, hours: u32) -> Result<(), SettingsError> {
        if !CANCEL_HOURS_RANGE.contains(&hours) {
            return Err(SettingsError::CancelHoursBefore(hours));
        }
        self.cancel_hours_before = hours;
        Ok(())
    }

    pub fn set_show_available_spots(&mut self, show: bool) {
        self.show_available_spots = show;
    }

    /// Revalide un singleton relu depuis le disque.
    pub fn validate(&self) -> Result<(), SettingsError> {
        Self::new(self.base_schedule_days, self.cancel_hours_before).map(|_| ())
    }
}

/// Jours de bonus par niveau de priorité (1 = le plus prioritaire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierBonusTable(BTreeMap<u8, u32>);

impl Default for TierBonusTable {
    fn default() -> Self {
        Self(BTreeMap::from([(1, 5), (2, 4), (3, 3), (4, 2), (5, 1)]))
    }
}

impl TierBonusTable {
    /// Niveau inconnu : aucun bonus.
    pub fn bonus(&self, tier: u8) -> u32 {
        self.0.get(&tier).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPolicy {
    #[serde(default)]
    pub tier_bonus: TierBonusTable,
}

/// Fuseau de référence. `Local` reproduit le comportement historique
/// (heure locale du serveur).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZonePolicy {
    #[default]
    Local,
    Named(Tz),
}

impl ZonePolicy {
    pub fn parse(name: &str) -> Result<Self, SettingsError> {
        if name.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        name.parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| SettingsError::UnknownZone(name.to_string()))
    }

    /// Heure murale courante dans ce fuseau.
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Self::Local => chrono::Local::now().naive_local(),
            Self::Named(tz) => Utc::now().with_timezone(tz).naive_local(),
        }
    }

    /// Instant réel d'une heure murale de ce fuseau.
    ///
    /// Heure ambiguë (retour à l'heure d'hiver) : première occurrence.
    /// Heure inexistante (passage à l'heure d'été) : décalage d'avant le saut.
    pub fn instant(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self {
            Self::Local => resolve_local(&chrono::Local, local),
            Self::Named(tz) => resolve_local(tz, local),
        }
    }
}

fn resolve_local<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> DateTime<Utc> {
    if let Some(dt) = zone.from_local_datetime(&local).earliest() {
        return dt.with_timezone(&Utc);
    }
    let before = local - TimeDelta::hours(1);
    match zone.from_local_datetime(&before).earliest() {
        Some(dt) => dt.with_timezone(&Utc) + TimeDelta::hours(1),
        None => local.and_utc(),
    }
}

/// Fichier de configuration JSON (optionnel) de la CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub policy: BookingPolicy,
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl EngineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let config: EngineConfig = serde_json::from_slice(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn zone(&self) -> Result<ZonePolicy, SettingsError> {
        match &self.time_zone {
            Some(name) => ZonePolicy::parse(name),
            None => Ok(ZonePolicy::Local),
        }
    }
}
