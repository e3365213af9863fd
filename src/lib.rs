#![forbid(unsafe_code)]
//! Shiftclaim : moteur de réservation de créneaux chauffeurs multi-marchés.
//!
//! - Templates récurrents, capacité par défaut et exceptions par jour de semaine.
//! - Fenêtre de réservation selon la priorité du chauffeur.
//! - Chevauchements, y compris les créneaux de nuit qui débordent sur J+1.
//! - Décisions pures ; l'état est fourni et persisté par l'appelant (`Ledger`, `Storage`).

pub mod config;
pub mod digest;
pub mod engine;
pub mod io;
pub mod ledger;
pub mod model;
pub mod storage;
pub mod time_range;

pub use config::{
    BookingPolicy, EngineConfig, SchedulingSettings, SettingsError, TierBonusTable, ZonePolicy,
};
pub use digest::{prepare_digest, DailyDigest, DigestRenderer, TextDigest};
pub use engine::{
    capacity_for_date, try_cancel, try_claim, window_days, within_window, CancelRequest,
    ClaimRequest, ClaimSnapshot, RejectReason,
};
pub use ledger::{Ledger, LedgerError};
pub use model::{
    BookedShift, BookingId, CapacityOverride, Driver, DriverId, Market, ShiftTemplate, TemplateId,
};
pub use storage::{JsonStorage, Storage};
pub use time_range::{overlaps, to_minutes, ClockTime, TimeFormatError, TimeRange};
