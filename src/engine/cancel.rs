use super::{CancelRequest, RejectReason};
use crate::config::SchedulingSettings;

/// Décide si une réservation peut être annulée à `request.now`.
///
/// Un créneau terminé reste de l'historique, même pour un admin. Sinon
/// l'override admin lève le préavis.
pub fn try_cancel(
    request: CancelRequest<'_>,
    settings: &SchedulingSettings,
) -> Result<(), RejectReason> {
    let CancelRequest {
        booking,
        template,
        now,
        zone,
        admin_override,
    } = request;

    let now = zone.instant(now);
    if zone.instant(template.ends_at(booking.date)) < now {
        return Err(RejectReason::ShiftAlreadyEnded);
    }

    if admin_override {
        return Ok(());
    }

    let until_start = zone.instant(template.starts_at(booking.date)) - now;
    let notice_secs = i64::from(settings.cancel_hours_before()) * 3600;
    if until_start.num_seconds() < notice_secs {
        return Err(RejectReason::WithinCancelWindow);
    }
    Ok(())
}
