use crate::model::{day_of_week, CapacityOverride, ShiftTemplate};
use chrono::NaiveDate;

/// Capacité effective d'un template pour une date : exception du jour de
/// semaine si elle est active, sinon capacité par défaut.
pub fn capacity_for_date(
    template: &ShiftTemplate,
    overrides: &[CapacityOverride],
    date: NaiveDate,
) -> u8 {
    let dow = day_of_week(date);
    overrides
        .iter()
        .find(|o| o.template_id == template.id && o.day_of_week == dow && !o.is_cleared())
        .map_or(template.capacity, |o| o.capacity)
}
