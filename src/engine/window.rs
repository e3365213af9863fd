use crate::config::BookingPolicy;
use chrono::NaiveDate;

/// Nombre de jours réservables à l'avance pour un niveau de priorité
/// (plafonné à `u32::MAX` si la table de bonus est démesurée).
pub fn window_days(policy: &BookingPolicy, priority_tier: u8, base_schedule_days: u32) -> u32 {
    base_schedule_days.saturating_add(policy.tier_bonus.bonus(priority_tier))
}

/// `0 <= date - today <= window` en jours calendaires entiers (bornes incluses).
pub fn within_window(date: NaiveDate, today: NaiveDate, window: u32) -> bool {
    let diff = date.signed_duration_since(today).num_days();
    (0..=i64::from(window)).contains(&diff)
}
