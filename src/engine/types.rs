use crate::config::{BookingPolicy, SchedulingSettings, ZonePolicy};
use crate::model::{BookedShift, CapacityOverride, Driver, ShiftTemplate};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Motifs de refus : des règles métier attendues, jamais des pannes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    #[error("driver is blocked from scheduling")]
    Blocked,
    #[error("shift template not found")]
    TemplateNotFound,
    #[error("outside your scheduling window")]
    OutsideWindow,
    #[error("shift is full")]
    ShiftFull,
    #[error("overlaps with a shift from the previous day")]
    OverlapsYesterday,
    #[error("overlaps with an existing shift")]
    OverlapsToday,
    #[error("overlaps with a shift on the next day")]
    OverlapsTomorrow,
    #[error("already scheduled for this shift")]
    AlreadyBooked,
    #[error("cannot cancel within the cancellation notice window")]
    WithinCancelWindow,
    #[error("shift has already ended")]
    ShiftAlreadyEnded,
}

impl RejectReason {
    /// Code stable pour les couches de transport.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::TemplateNotFound => "template_not_found",
            Self::OutsideWindow => "outside_window",
            Self::ShiftFull => "shift_full",
            Self::OverlapsYesterday => "overlaps_yesterday",
            Self::OverlapsToday => "overlaps_today",
            Self::OverlapsTomorrow => "overlaps_tomorrow",
            Self::AlreadyBooked => "already_booked",
            Self::WithinCancelWindow => "within_cancel_window",
            Self::ShiftAlreadyEnded => "shift_already_ended",
        }
    }
}

/// Instantané fourni par l'appelant pour décider d'une réservation.
///
/// `bookings` doit contenir au moins toutes les réservations du template à
/// la date demandée (tous chauffeurs) et celles du chauffeur sur J-1, J et
/// J+1. `templates` sert à résoudre les horaires de ces réservations.
#[derive(Debug, Clone, Copy)]
pub struct ClaimSnapshot<'a> {
    pub templates: &'a [ShiftTemplate],
    pub bookings: &'a [BookedShift],
    pub overrides: &'a [CapacityOverride],
    pub settings: &'a SchedulingSettings,
    pub policy: &'a BookingPolicy,
}

#[derive(Debug, Clone, Copy)]
pub struct ClaimRequest<'a> {
    pub driver: &'a Driver,
    pub template: Option<&'a ShiftTemplate>,
    pub date: NaiveDate,
    /// Heure murale courante, dans le fuseau de référence.
    pub now: NaiveDateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct CancelRequest<'a> {
    pub booking: &'a BookedShift,
    pub template: &'a ShiftTemplate,
    /// Heure murale courante, dans `zone`.
    pub now: NaiveDateTime,
    /// Fuseau des heures murales : le préavis se mesure en temps réel,
    /// changements d'heure compris.
    pub zone: ZonePolicy,
    pub admin_override: bool,
}
