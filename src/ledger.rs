//! Ledger : état détenu par l'appelant (marchés, chauffeurs, templates,
//! exceptions, réservations, réglages) sur lequel les décisions du moteur
//! sont appliquées.
//!
//! `claim` lit, décide et insère sous un emprunt exclusif (`&mut self`) :
//! pour un partage entre threads, placer le ledger derrière un `Mutex`.

use crate::config::{BookingPolicy, SchedulingSettings, SettingsError, ZonePolicy};
use crate::engine::{self, CancelRequest, ClaimRequest, ClaimSnapshot, RejectReason};
use crate::model::{
    day_of_week, BookedShift, BookingId, CapacityOverride, Driver, DriverId, Market, ShiftTemplate,
    TemplateId, MAX_CAPACITY, MIN_TEMPLATE_CAPACITY,
};
use crate::time_range::ClockTime;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("unknown driver: {0}")]
    UnknownDriver(String),
    #[error("unknown template: {0}")]
    UnknownTemplate(String),
    #[error("unknown booking: {0}")]
    UnknownBooking(String),
    #[error("unknown market: {0}")]
    UnknownMarket(String),
    #[error("market is inactive: {0}")]
    InactiveMarket(String),
    #[error("already exists: {0}")]
    Duplicate(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error(transparent)]
    Rejected(#[from] RejectReason),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl LedgerError {
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Capacité d'un jour de semaine, pour l'écran d'administration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCapacity {
    pub day_of_week: u8,
    pub day_name: &'static str,
    pub capacity: u8,
    pub is_override: bool,
}

/// Disponibilité d'un template pour une date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftAvailability {
    pub template_id: TemplateId,
    pub market: String,
    pub start: ClockTime,
    pub end: ClockTime,
    pub capacity: u8,
    pub default_capacity: u8,
    pub booked: usize,
    pub available: usize,
    pub drivers: Vec<BookedDriver>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookedDriver {
    pub driver_id: DriverId,
    pub name: String,
    pub booking_id: BookingId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub(crate) markets: Vec<Market>,
    #[serde(default)]
    pub(crate) drivers: Vec<Driver>,
    #[serde(default)]
    pub(crate) templates: Vec<ShiftTemplate>,
    #[serde(default)]
    pub(crate) overrides: Vec<CapacityOverride>,
    #[serde(default)]
    pub(crate) bookings: Vec<BookedShift>,
    #[serde(default)]
    pub(crate) settings: SchedulingSettings,
    #[serde(skip)]
    policy: BookingPolicy,
    #[serde(skip)]
    zone: ZonePolicy,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: BookingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_policy(&mut self, policy: BookingPolicy) {
        self.policy = policy;
    }

    /// Fuseau des heures murales passées à `claim`/`cancel`.
    pub fn with_zone(mut self, zone: ZonePolicy) -> Self {
        self.zone = zone;
        self
    }

    pub fn set_zone(&mut self, zone: ZonePolicy) {
        self.zone = zone;
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }
    pub fn zone(&self) -> ZonePolicy {
        self.zone
    }
    pub fn settings(&self) -> &SchedulingSettings {
        &self.settings
    }
    pub fn markets(&self) -> &[Market] {
        &self.markets
    }
    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }
    pub fn templates(&self) -> &[ShiftTemplate] {
        &self.templates
    }
    pub fn overrides(&self) -> &[CapacityOverride] {
        &self.overrides
    }
    pub fn bookings(&self) -> &[BookedShift] {
        &self.bookings
    }

    /// Revalide un ledger relu depuis un support externe : réglages,
    /// bornes des capacités et priorités, unicités du modèle.
    pub fn validate(&self) -> Result<(), LedgerError> {
        self.settings.validate()?;

        let mut codes = HashSet::new();
        for m in &self.markets {
            if !codes.insert(m.code.as_str()) {
                return Err(LedgerError::Duplicate(format!("market {}", m.code)));
            }
        }

        let mut driver_ids = HashSet::new();
        for d in &self.drivers {
            validate_priority(d.priority).map_err(|_| {
                LedgerError::Invalid(format!("driver {}: priority must be 1-5", d.id))
            })?;
            if !driver_ids.insert(&d.id) {
                return Err(LedgerError::Duplicate(format!("driver {}", d.id)));
            }
        }

        let mut template_ids = HashSet::new();
        let mut slots = HashSet::new();
        for t in &self.templates {
            validate_template_capacity(t.capacity).map_err(|_| {
                LedgerError::Invalid(format!("template {}: capacity must be 1-20", t.id))
            })?;
            if !template_ids.insert(&t.id) {
                return Err(LedgerError::Duplicate(format!("template {}", t.id)));
            }
            if !slots.insert((t.market.as_str(), t.start, t.end)) {
                return Err(LedgerError::Duplicate(format!(
                    "template {}-{} in market {}",
                    t.start, t.end, t.market
                )));
            }
        }

        let mut override_keys = HashSet::new();
        for o in &self.overrides {
            if o.day_of_week > 6 {
                return Err(LedgerError::Invalid(format!(
                    "override for template {}: dayOfWeek must be 0-6",
                    o.template_id
                )));
            }
            if o.capacity > MAX_CAPACITY {
                return Err(LedgerError::Invalid(format!(
                    "override for template {}: capacity must be 0-20",
                    o.template_id
                )));
            }
            if !override_keys.insert((&o.template_id, o.day_of_week)) {
                return Err(LedgerError::Duplicate(format!(
                    "override for template {} on day {}",
                    o.template_id, o.day_of_week
                )));
            }
        }

        let mut booking_ids = HashSet::new();
        let mut instances = HashSet::new();
        for b in &self.bookings {
            if !booking_ids.insert(&b.id) {
                return Err(LedgerError::Duplicate(format!("booking {}", b.id)));
            }
            if !instances.insert((&b.driver_id, &b.template_id, b.date)) {
                return Err(LedgerError::Duplicate(format!(
                    "booking of driver {} on template {} for {}",
                    b.driver_id, b.template_id, b.date
                )));
            }
        }
        Ok(())
    }

    pub fn find_market(&self, code: &str) -> Option<&Market> {
        let code = normalize_market(code);
        self.markets.iter().find(|m| m.code == code)
    }
    pub fn find_driver(&self, id: &DriverId) -> Option<&Driver> {
        self.drivers.iter().find(|d| &d.id == id)
    }
    fn find_driver_mut(&mut self, id: &DriverId) -> Result<&mut Driver, LedgerError> {
        self.drivers
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| LedgerError::UnknownDriver(id.to_string()))
    }
    pub fn find_template(&self, id: &TemplateId) -> Option<&ShiftTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }
    fn template_or_err(&self, id: &TemplateId) -> Result<&ShiftTemplate, LedgerError> {
        self.find_template(id)
            .ok_or_else(|| LedgerError::UnknownTemplate(id.to_string()))
    }
    pub fn find_booking(&self, id: &BookingId) -> Option<&BookedShift> {
        self.bookings.iter().find(|b| &b.id == id)
    }

    // --- marchés -------------------------------------------------------

    pub fn add_market(&mut self, code: &str, name: &str) -> Result<&Market, LedgerError> {
        let code = normalize_market(code);
        if code.is_empty() || name.trim().is_empty() {
            return Err(LedgerError::Invalid("market code and name are required".into()));
        }
        if self.find_market(&code).is_some() {
            return Err(LedgerError::Duplicate(format!("market {code}")));
        }
        tracing::info!(market = %code, "market added");
        self.markets.push(Market {
            code,
            name: name.trim().to_string(),
            active: true,
        });
        Ok(&self.markets[self.markets.len() - 1])
    }

    pub fn set_market_active(&mut self, code: &str, active: bool) -> Result<(), LedgerError> {
        let code = normalize_market(code);
        let market = self
            .markets
            .iter_mut()
            .find(|m| m.code == code)
            .ok_or_else(|| LedgerError::UnknownMarket(code.clone()))?;
        market.active = active;
        tracing::info!(market = %code, active, "market status changed");
        Ok(())
    }

    /// Supprime un marché qui n'est plus référencé par aucun chauffeur ni template.
    pub fn remove_market(&mut self, code: &str) -> Result<Market, LedgerError> {
        let code = normalize_market(code);
        let pos = self
            .markets
            .iter()
            .position(|m| m.code == code)
            .ok_or_else(|| LedgerError::UnknownMarket(code.clone()))?;
        let drivers = self.drivers.iter().filter(|d| d.market == code).count();
        let templates = self.templates.iter().filter(|t| t.market == code).count();
        if drivers > 0 || templates > 0 {
            return Err(LedgerError::Invalid(format!(
                "cannot delete market {code}: {drivers} drivers and {templates} templates still use it"
            )));
        }
        tracing::info!(market = %code, "market removed");
        Ok(self.markets.remove(pos))
    }

    fn active_market(&self, code: &str) -> Result<String, LedgerError> {
        let market = self
            .find_market(code)
            .ok_or_else(|| LedgerError::UnknownMarket(normalize_market(code)))?;
        if !market.active {
            return Err(LedgerError::InactiveMarket(market.code.clone()));
        }
        Ok(market.code.clone())
    }

    // --- chauffeurs ----------------------------------------------------

    pub fn register_driver(&mut self, mut driver: Driver) -> Result<(), LedgerError> {
        validate_priority(driver.priority)?;
        if driver.name.trim().is_empty() {
            return Err(LedgerError::Invalid("driver name is required".into()));
        }
        if self.find_driver(&driver.id).is_some() {
            return Err(LedgerError::Duplicate(format!("driver {}", driver.id)));
        }
        driver.market = self
            .find_market(&driver.market)
            .map(|m| m.code.clone())
            .ok_or_else(|| LedgerError::UnknownMarket(normalize_market(&driver.market)))?;
        tracing::info!(driver = %driver.id, market = %driver.market, "driver registered");
        self.drivers.push(driver);
        Ok(())
    }

    pub fn set_driver_blocked(&mut self, id: &DriverId, blocked: bool) -> Result<(), LedgerError> {
        self.find_driver_mut(id)?.blocked = blocked;
        tracing::info!(driver = %id, blocked, "driver block status changed");
        Ok(())
    }

    pub fn set_driver_priority(&mut self, id: &DriverId, priority: u8) -> Result<(), LedgerError> {
        validate_priority(priority)?;
        self.find_driver_mut(id)?.priority = priority;
        tracing::info!(driver = %id, priority, "driver priority changed");
        Ok(())
    }

    /// Renomme un chauffeur et/ou le rattache à un autre marché existant.
    pub fn update_driver(
        &mut self,
        id: &DriverId,
        name: Option<&str>,
        market: Option<&str>,
    ) -> Result<(), LedgerError> {
        if name.is_none() && market.is_none() {
            return Err(LedgerError::Invalid("no fields to update".into()));
        }
        let name = match name.map(str::trim) {
            Some("") => return Err(LedgerError::Invalid("driver name is required".into())),
            other => other.map(str::to_string),
        };
        let market = match market {
            Some(code) => Some(
                self.find_market(code)
                    .map(|m| m.code.clone())
                    .ok_or_else(|| LedgerError::UnknownMarket(normalize_market(code)))?,
            ),
            None => None,
        };

        let driver = self.find_driver_mut(id)?;
        if let Some(name) = name {
            driver.name = name;
        }
        if let Some(market) = market {
            driver.market = market;
        }
        tracing::info!(driver = %id, market = %driver.market, "driver updated");
        Ok(())
    }

    // --- templates -----------------------------------------------------

    pub fn add_template(
        &mut self,
        market: &str,
        start: ClockTime,
        end: ClockTime,
        capacity: u8,
    ) -> Result<TemplateId, LedgerError> {
        let market = self.active_market(market)?;
        validate_template_capacity(capacity)?;
        if self
            .templates
            .iter()
            .any(|t| t.market == market && t.start == start && t.end == end)
        {
            return Err(LedgerError::Duplicate(format!(
                "template {start}-{end} in market {market}"
            )));
        }
        let template = ShiftTemplate::new(market, start, end, capacity);
        let id = template.id.clone();
        tracing::info!(template = %id, market = %template.market, range = %template.range(), capacity, "template added");
        self.templates.push(template);
        Ok(id)
    }

    /// Refuse de descendre sous le nombre de réservations déjà prises sur
    /// une même date à venir.
    pub fn update_template_capacity(
        &mut self,
        id: &TemplateId,
        capacity: u8,
        today: NaiveDate,
    ) -> Result<(), LedgerError> {
        validate_template_capacity(capacity)?;
        self.template_or_err(id)?;

        let mut per_date: HashMap<NaiveDate, usize> = HashMap::new();
        for b in self
            .bookings
            .iter()
            .filter(|b| &b.template_id == id && b.date >= today)
        {
            *per_date.entry(b.date).or_default() += 1;
        }
        let busiest = per_date.values().copied().max().unwrap_or(0);
        if usize::from(capacity) < busiest {
            return Err(LedgerError::Invalid(format!(
                "cannot reduce capacity below {busiest} (currently scheduled)"
            )));
        }

        if let Some(template) = self.templates.iter_mut().find(|t| &t.id == id) {
            template.capacity = capacity;
        }
        tracing::info!(template = %id, capacity, "template capacity changed");
        Ok(())
    }

    /// Déplace les horaires d'un template. Les réservations existantes
    /// suivent le template ; le couple (marché, début, fin) reste unique.
    pub fn update_template_times(
        &mut self,
        id: &TemplateId,
        start: Option<ClockTime>,
        end: Option<ClockTime>,
    ) -> Result<(), LedgerError> {
        if start.is_none() && end.is_none() {
            return Err(LedgerError::Invalid("no fields to update".into()));
        }
        let current = self.template_or_err(id)?;
        let start = start.unwrap_or(current.start);
        let end = end.unwrap_or(current.end);
        let market = current.market.clone();
        if self
            .templates
            .iter()
            .any(|t| &t.id != id && t.market == market && t.start == start && t.end == end)
        {
            return Err(LedgerError::Duplicate(format!(
                "template {start}-{end} in market {market}"
            )));
        }

        if let Some(template) = self.templates.iter_mut().find(|t| &t.id == id) {
            template.start = start;
            template.end = end;
        }
        tracing::info!(template = %id, %start, %end, "template times changed");
        Ok(())
    }

    /// Supprime un template sans réservation à venir, avec ses exceptions
    /// et son historique.
    pub fn remove_template(&mut self, id: &TemplateId, today: NaiveDate) -> Result<(), LedgerError> {
        self.template_or_err(id)?;
        let upcoming = self
            .bookings
            .iter()
            .filter(|b| &b.template_id == id && b.date >= today)
            .count();
        if upcoming > 0 {
            return Err(LedgerError::Invalid(format!(
                "cannot delete template with {upcoming} scheduled shifts"
            )));
        }
        self.templates.retain(|t| &t.id != id);
        self.overrides.retain(|o| &o.template_id != id);
        let before = self.bookings.len();
        self.bookings.retain(|b| &b.template_id != id);
        tracing::info!(template = %id, past_bookings = before - self.bookings.len(), "template removed");
        Ok(())
    }

    // --- exceptions de capacité ---------------------------------------

    /// Pose (ou remplace) l'exception d'un jour de semaine ;
    /// [`CapacityOverride::CLEARED`] la supprime.
    pub fn set_override(
        &mut self,
        template_id: &TemplateId,
        day_of_week: u8,
        capacity: u8,
    ) -> Result<(), LedgerError> {
        self.template_or_err(template_id)?;
        if day_of_week > 6 {
            return Err(LedgerError::Invalid("dayOfWeek must be 0-6".into()));
        }
        if capacity > MAX_CAPACITY {
            return Err(LedgerError::Invalid("capacity must be 0-20 (0 uses default)".into()));
        }

        self.overrides
            .retain(|o| !(&o.template_id == template_id && o.day_of_week == day_of_week));
        if capacity != CapacityOverride::CLEARED {
            self.overrides.push(CapacityOverride {
                template_id: template_id.clone(),
                day_of_week,
                capacity,
            });
        }
        tracing::info!(template = %template_id, day_of_week, capacity, "capacity override set");
        Ok(())
    }

    pub fn clear_overrides(&mut self, template_id: &TemplateId) -> Result<(), LedgerError> {
        self.template_or_err(template_id)?;
        self.overrides.retain(|o| &o.template_id != template_id);
        tracing::info!(template = %template_id, "capacity overrides cleared");
        Ok(())
    }

    pub fn week_capacities(&self, template_id: &TemplateId) -> Result<Vec<DayCapacity>, LedgerError> {
        let template = self.template_or_err(template_id)?;
        Ok((0u8..7)
            .map(|dow| {
                let active = self.overrides.iter().find(|o| {
                    &o.template_id == template_id && o.day_of_week == dow && !o.is_cleared()
                });
                DayCapacity {
                    day_of_week: dow,
                    day_name: DAY_NAMES[usize::from(dow)],
                    capacity: active.map_or(template.capacity, |o| o.capacity),
                    is_override: active.is_some(),
                }
            })
            .collect())
    }

    pub fn capacity_for(&self, template_id: &TemplateId, date: NaiveDate) -> Result<u8, LedgerError> {
        let template = self.template_or_err(template_id)?;
        Ok(engine::capacity_for_date(template, &self.overrides, date))
    }

    /// Créneaux d'un marché pour une date, triés par heure de début.
    pub fn availability(&self, market: &str, date: NaiveDate) -> Vec<ShiftAvailability> {
        let market = normalize_market(market);
        let mut templates: Vec<&ShiftTemplate> =
            self.templates.iter().filter(|t| t.market == market).collect();
        templates.sort_by_key(|t| (t.start, t.end));

        templates
            .into_iter()
            .map(|t| {
                let drivers: Vec<BookedDriver> = self
                    .bookings
                    .iter()
                    .filter(|b| b.template_id == t.id && b.date == date)
                    .map(|b| BookedDriver {
                        driver_id: b.driver_id.clone(),
                        name: self
                            .find_driver(&b.driver_id)
                            .map(|d| d.name.clone())
                            .unwrap_or_default(),
                        booking_id: b.id.clone(),
                    })
                    .collect();
                let capacity = engine::capacity_for_date(t, &self.overrides, date);
                ShiftAvailability {
                    template_id: t.id.clone(),
                    market: t.market.clone(),
                    start: t.start,
                    end: t.end,
                    capacity,
                    default_capacity: t.capacity,
                    booked: drivers.len(),
                    available: usize::from(capacity).saturating_sub(drivers.len()),
                    drivers,
                }
            })
            .collect()
    }

    // --- réservations --------------------------------------------------

    pub fn claim(
        &mut self,
        driver_id: &DriverId,
        template_id: &TemplateId,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<BookedShift, LedgerError> {
        let driver = self
            .find_driver(driver_id)
            .ok_or_else(|| LedgerError::UnknownDriver(driver_id.to_string()))?;
        let request = ClaimRequest {
            driver,
            template: self.find_template(template_id),
            date,
            now,
        };
        let snapshot = ClaimSnapshot {
            templates: &self.templates,
            bookings: &self.bookings,
            overrides: &self.overrides,
            settings: &self.settings,
            policy: &self.policy,
        };

        let booking = match engine::try_claim(request, snapshot) {
            Ok(booking) => booking,
            Err(reason) => {
                tracing::debug!(driver = %driver_id, template = %template_id, %date, reason = reason.code(), "claim rejected");
                return Err(reason.into());
            }
        };
        tracing::debug!(booking = %booking.id, driver = %driver_id, template = %template_id, %date, "shift claimed");
        self.bookings.push(booking.clone());
        Ok(booking)
    }

    /// Annulation par le chauffeur (préavis) ou par un admin (`admin_override`).
    pub fn cancel(
        &mut self,
        booking_id: &BookingId,
        now: NaiveDateTime,
        admin_override: bool,
    ) -> Result<BookedShift, LedgerError> {
        let pos = self
            .bookings
            .iter()
            .position(|b| &b.id == booking_id)
            .ok_or_else(|| LedgerError::UnknownBooking(booking_id.to_string()))?;
        let booking = &self.bookings[pos];
        let template = self.template_or_err(&booking.template_id)?;

        let request = CancelRequest {
            booking,
            template,
            now,
            zone: self.zone,
            admin_override,
        };
        if let Err(reason) = engine::try_cancel(request, &self.settings) {
            tracing::debug!(booking = %booking_id, reason = reason.code(), "cancellation rejected");
            return Err(reason.into());
        }
        tracing::debug!(booking = %booking_id, admin_override, "shift cancelled");
        Ok(self.bookings.remove(pos))
    }

    /// Retrait administratif, sans contrôle de préavis.
    pub fn remove_booking(&mut self, booking_id: &BookingId) -> Result<BookedShift, LedgerError> {
        let pos = self
            .bookings
            .iter()
            .position(|b| &b.id == booking_id)
            .ok_or_else(|| LedgerError::UnknownBooking(booking_id.to_string()))?;
        tracing::info!(booking = %booking_id, "booking removed by admin");
        Ok(self.bookings.remove(pos))
    }

    /// Réservations d'un chauffeur, par date puis heure de début.
    pub fn bookings_for_driver(&self, driver_id: &DriverId) -> Vec<&BookedShift> {
        let mut out: Vec<&BookedShift> = self
            .bookings
            .iter()
            .filter(|b| &b.driver_id == driver_id)
            .collect();
        out.sort_by_key(|b| {
            (
                b.date,
                self.find_template(&b.template_id).map(|t| t.start),
            )
        });
        out
    }

    pub fn bookings_on(&self, date: NaiveDate) -> Vec<&BookedShift> {
        self.bookings.iter().filter(|b| b.date == date).collect()
    }

    // --- réglages ------------------------------------------------------

    /// Mise à jour partielle ; rien n'est appliqué si une valeur est invalide.
    pub fn update_settings(
        &mut self,
        base_schedule_days: Option<u32>,
        cancel_hours_before: Option<u32>,
        show_available_spots: Option<bool>,
    ) -> Result<&SchedulingSettings, LedgerError> {
        let mut next = self.settings;
        if let Some(days) = base_schedule_days {
            next.set_base_schedule_days(days)?;
        }
        if let Some(hours) = cancel_hours_before {
            next.set_cancel_hours_before(hours)?;
        }
        if let Some(show) = show_available_spots {
            next.set_show_available_spots(show);
        }
        self.settings = next;
        tracing::info!(
            base_schedule_days = next.base_schedule_days(),
            cancel_hours_before = next.cancel_hours_before(),
            "scheduling settings updated"
        );
        Ok(&self.settings)
    }

    pub(crate) fn weekday_of(date: NaiveDate) -> &'static str {
        DAY_NAMES[usize::from(day_of_week(date))]
    }
}

fn normalize_market(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

fn validate_priority(priority: u8) -> Result<(), LedgerError> {
    if !(1..=5).contains(&priority) {
        return Err(LedgerError::Invalid("priority must be 1-5".into()));
    }
    Ok(())
}

fn validate_template_capacity(capacity: u8) -> Result<(), LedgerError> {
    if !(MIN_TEMPLATE_CAPACITY..=MAX_CAPACITY).contains(&capacity) {
        return Err(LedgerError::Invalid("capacity must be 1-20".into()));
    }
    Ok(())
}
