#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveDateTime};
use shiftclaim::model::{BookedShift, BookingId, DriverId, ShiftTemplate, TemplateId};
use shiftclaim::{try_cancel, CancelRequest, RejectReason, SchedulingSettings, ZonePolicy};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    day.and_hms_opt(h, m, 0).unwrap()
}

fn template(start: &str, end: &str) -> ShiftTemplate {
    ShiftTemplate {
        id: TemplateId::new("t"),
        market: "avl".into(),
        start: start.parse().unwrap(),
        end: end.parse().unwrap(),
        capacity: 2,
    }
}

fn booking(day: NaiveDate) -> BookedShift {
    BookedShift {
        id: BookingId::new("b1"),
        driver_id: DriverId::new("dana"),
        template_id: TemplateId::new("t"),
        date: day,
        created_at: at(date(2024, 6, 1), 9, 0),
    }
}

fn zone(name: &str) -> ZonePolicy {
    ZonePolicy::parse(name).unwrap()
}

fn cancel_in(
    zone: ZonePolicy,
    t: &ShiftTemplate,
    b: &BookedShift,
    now: NaiveDateTime,
    admin_override: bool,
    settings: &SchedulingSettings,
) -> Result<(), RejectReason> {
    try_cancel(
        CancelRequest {
            booking: b,
            template: t,
            now,
            zone,
            admin_override,
        },
        settings,
    )
}

fn cancel(
    t: &ShiftTemplate,
    b: &BookedShift,
    now: NaiveDateTime,
    admin_override: bool,
    settings: &SchedulingSettings,
) -> Result<(), RejectReason> {
    cancel_in(zone("UTC"), t, b, now, admin_override, settings)
}

#[test]
fn notice_window_blocks_late_cancellation() {
    let settings = SchedulingSettings::new(7, 24).unwrap();
    let t = template("08:00", "16:00");
    let b = booking(date(2024, 6, 11));
    // Début dans 20 h.
    let now = at(date(2024, 6, 10), 12, 0);

    assert_eq!(
        cancel(&t, &b, now, false, &settings),
        Err(RejectReason::WithinCancelWindow)
    );
    assert_eq!(cancel(&t, &b, now, true, &settings), Ok(()));
}

#[test]
fn exact_notice_boundary_is_allowed() {
    let settings = SchedulingSettings::new(7, 24).unwrap();
    let t = template("08:00", "16:00");
    let b = booking(date(2024, 6, 11));

    assert_eq!(cancel(&t, &b, at(date(2024, 6, 10), 8, 0), false, &settings), Ok(()));
    let one_second_late = at(date(2024, 6, 10), 8, 0) + chrono::Duration::seconds(1);
    assert_eq!(
        cancel(&t, &b, one_second_late, false, &settings),
        Err(RejectReason::WithinCancelWindow)
    );
}

#[test]
fn ended_shift_cannot_be_cancelled_even_by_admin() {
    let settings = SchedulingSettings::default();
    let t = template("08:00", "16:00");
    let b = booking(date(2024, 6, 9));
    let now = at(date(2024, 6, 10), 12, 0);

    assert_eq!(cancel(&t, &b, now, false, &settings), Err(RejectReason::ShiftAlreadyEnded));
    assert_eq!(cancel(&t, &b, now, true, &settings), Err(RejectReason::ShiftAlreadyEnded));
}

#[test]
fn wrapping_shift_ends_on_next_day() {
    let settings = SchedulingSettings::default();
    let t = template("22:00", "02:00");
    let b = booking(date(2024, 6, 9));

    // En cours (fin le 10 à 02:00) : pas terminé, mais préavis dépassé.
    let during = at(date(2024, 6, 10), 1, 0);
    assert_eq!(
        cancel(&t, &b, during, false, &settings),
        Err(RejectReason::WithinCancelWindow)
    );
    assert_eq!(cancel(&t, &b, during, true, &settings), Ok(()));

    let after = at(date(2024, 6, 10), 2, 1);
    assert_eq!(cancel(&t, &b, after, true, &settings), Err(RejectReason::ShiftAlreadyEnded));
}

#[test]
fn shift_ending_exactly_now_is_not_yet_history() {
    let settings = SchedulingSettings::default();
    let t = template("08:00", "16:00");
    let b = booking(date(2024, 6, 10));
    assert_eq!(cancel(&t, &b, at(date(2024, 6, 10), 16, 0), true, &settings), Ok(()));
}

#[test]
fn notice_is_measured_in_real_hours_across_spring_forward() {
    let settings = SchedulingSettings::new(7, 20).unwrap();
    let t = template("08:00", "16:00");
    // Passage à l'heure d'été à New York dans la nuit du 9 au 10 mars 2024.
    let b = booking(date(2024, 3, 10));
    let now = at(date(2024, 3, 9), 12, 0);

    // 20 h à l'horloge, 19 h réelles.
    assert_eq!(
        cancel_in(zone("America/New_York"), &t, &b, now, false, &settings),
        Err(RejectReason::WithinCancelWindow)
    );
    assert_eq!(cancel_in(zone("UTC"), &t, &b, now, false, &settings), Ok(()));
}

#[test]
fn notice_is_measured_in_real_hours_across_fall_back() {
    let settings = SchedulingSettings::new(7, 20).unwrap();
    let t = template("07:00", "15:00");
    // Retour à l'heure d'hiver dans la nuit du 2 au 3 novembre 2024.
    let b = booking(date(2024, 11, 3));
    let now = at(date(2024, 11, 2), 12, 0);

    // 19 h à l'horloge, 20 h réelles.
    assert_eq!(
        cancel_in(zone("America/New_York"), &t, &b, now, false, &settings),
        Ok(())
    );
    assert_eq!(
        cancel_in(zone("UTC"), &t, &b, now, false, &settings),
        Err(RejectReason::WithinCancelWindow)
    );
}

#[test]
fn ended_check_uses_real_instants() {
    let settings = SchedulingSettings::default();
    // 00:30-01:30 le 3 novembre : 01:30 existe deux fois, la première compte.
    let t = template("00:30", "01:30");
    let b = booking(date(2024, 11, 3));
    let ny = zone("America/New_York");

    let during = at(date(2024, 11, 3), 1, 0);
    assert_eq!(cancel_in(ny, &t, &b, during, true, &settings), Ok(()));
    let after = at(date(2024, 11, 3), 1, 31);
    assert_eq!(
        cancel_in(ny, &t, &b, after, true, &settings),
        Err(RejectReason::ShiftAlreadyEnded)
    );
}

#[test]
fn zone_resolves_gaps_and_ambiguous_times() {
    let ny = zone("America/New_York");
    // 02:30 n'existe pas le 10 mars : lu avec le décalage d'avant le saut (EST).
    let gap = ny.instant(at(date(2024, 3, 10), 2, 30));
    assert_eq!(gap, at(date(2024, 3, 10), 7, 30).and_utc());
    // 01:30 existe deux fois le 3 novembre : première occurrence (EDT).
    let ambiguous = ny.instant(at(date(2024, 11, 3), 1, 30));
    assert_eq!(ambiguous, at(date(2024, 11, 3), 5, 30).and_utc());
}

#[test]
fn settings_reject_out_of_range_values() {
    assert!(SchedulingSettings::new(0, 24).is_err());
    assert!(SchedulingSettings::new(31, 24).is_err());
    assert!(SchedulingSettings::new(7, 0).is_err());
    assert!(SchedulingSettings::new(7, 73).is_err());
    let s = SchedulingSettings::new(30, 72).unwrap();
    assert_eq!(s.base_schedule_days(), 30);
    assert_eq!(s.cancel_hours_before(), 72);
}
