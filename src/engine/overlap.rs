use super::RejectReason;
use crate::model::{BookedShift, DriverId, ShiftTemplate, TemplateId};
use chrono::NaiveDate;

/// Réservation du chauffeur accompagnée de son template résolu.
pub(super) struct DriverShift<'a> {
    pub booking: &'a BookedShift,
    pub template: &'a ShiftTemplate,
}

pub(super) fn driver_shifts<'a>(
    driver: &DriverId,
    bookings: &'a [BookedShift],
    templates: &'a [ShiftTemplate],
) -> Vec<DriverShift<'a>> {
    bookings
        .iter()
        .filter(|b| &b.driver_id == driver)
        .filter_map(|booking| match find_template(templates, &booking.template_id) {
            Some(template) => Some(DriverShift { booking, template }),
            None => {
                tracing::warn!(
                    booking = %booking.id,
                    template = %booking.template_id,
                    "booking references unknown template, skipped by overlap scan"
                );
                None
            }
        })
        .collect()
}

pub(super) fn find_template<'a>(
    templates: &'a [ShiftTemplate],
    id: &TemplateId,
) -> Option<&'a ShiftTemplate> {
    templates.iter().find(|t| &t.id == id)
}

/// Veille, même jour, puis lendemain (seulement si le nouveau créneau passe minuit).
pub(super) fn find_conflict(
    candidate: &ShiftTemplate,
    date: NaiveDate,
    shifts: &[DriverShift<'_>],
) -> Option<RejectReason> {
    let new_start = candidate.start.minutes();
    let new_end = candidate.end.minutes();

    if let Some(yesterday) = date.pred_opt() {
        let spills = shifts.iter().any(|s| {
            s.booking.date == yesterday && s.template.wraps() && new_start < s.template.end.minutes()
        });
        if spills {
            return Some(RejectReason::OverlapsYesterday);
        }
    }

    let range = candidate.range();
    if shifts
        .iter()
        .any(|s| s.booking.date == date && s.template.range().overlaps(&range))
    {
        return Some(RejectReason::OverlapsToday);
    }

    if candidate.wraps() {
        if let Some(tomorrow) = date.succ_opt() {
            if shifts
                .iter()
                .any(|s| s.booking.date == tomorrow && s.template.start.minutes() < new_end)
            {
                return Some(RejectReason::OverlapsTomorrow);
            }
        }
    }

    None
}
