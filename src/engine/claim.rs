use super::{capacity, overlap, window, ClaimRequest, ClaimSnapshot, RejectReason};
use crate::model::{BookedShift, BookingId};

/// Décide si `request.driver` peut prendre `request.template` à `request.date`.
///
/// Contrôles dans l'ordre, arrêt au premier échec : blocage, template,
/// fenêtre de réservation, capacité, chevauchements (veille, jour, lendemain),
/// doublon exact. Fonction pure : l'appelant persiste le résultat.
pub fn try_claim(
    request: ClaimRequest<'_>,
    snapshot: ClaimSnapshot<'_>,
) -> Result<BookedShift, RejectReason> {
    let ClaimRequest {
        driver,
        template,
        date,
        now,
    } = request;

    if driver.blocked {
        return Err(RejectReason::Blocked);
    }

    let template = template.ok_or(RejectReason::TemplateNotFound)?;

    let horizon = window::window_days(
        snapshot.policy,
        driver.priority,
        snapshot.settings.base_schedule_days(),
    );
    if !window::within_window(date, now.date(), horizon) {
        return Err(RejectReason::OutsideWindow);
    }

    let seats = capacity::capacity_for_date(template, snapshot.overrides, date);
    let taken = snapshot
        .bookings
        .iter()
        .filter(|b| b.template_id == template.id && b.date == date)
        .count();
    if taken >= usize::from(seats) {
        return Err(RejectReason::ShiftFull);
    }

    let mine = overlap::driver_shifts(&driver.id, snapshot.bookings, snapshot.templates);
    if let Some(reason) = overlap::find_conflict(template, date, &mine) {
        return Err(reason);
    }

    if snapshot
        .bookings
        .iter()
        .any(|b| b.is_instance(&driver.id, &template.id, date))
    {
        return Err(RejectReason::AlreadyBooked);
    }

    Ok(BookedShift {
        id: BookingId::random(),
        driver_id: driver.id.clone(),
        template_id: template.id.clone(),
        date,
        created_at: now,
    })
}
