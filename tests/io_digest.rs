#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveDateTime};
use shiftclaim::io::{
    export_bookings_csv, export_capacities_csv, import_drivers_csv, import_templates_csv,
};
use shiftclaim::model::{Driver, DriverId};
use shiftclaim::{prepare_digest, ClockTime, DigestRenderer, Ledger, TextDigest};
use std::fs;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    day.and_hms_opt(h, m, 0).unwrap()
}

fn hm(s: &str) -> ClockTime {
    s.parse().unwrap()
}

#[test]
fn import_drivers_with_optional_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drivers.csv");
    fs::write(
        &path,
        "id,name,market,priority,blocked\nd1,Alice,avl,1,\nd2,Bob,tto,,yes\nd3,Carol,avl,,\n",
    )
    .unwrap();

    let drivers = import_drivers_csv(&path).unwrap();
    assert_eq!(drivers.len(), 3);
    assert_eq!(drivers[0].priority, 1);
    assert!(!drivers[0].blocked);
    assert_eq!(drivers[1].priority, 5);
    assert!(drivers[1].blocked);
    assert_eq!(drivers[2].market, "avl");
}

#[test]
fn import_drivers_rejects_empty_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drivers.csv");
    fs::write(&path, "id,name,market\nd1,,avl\n").unwrap();
    assert!(import_drivers_csv(&path).is_err());
}

#[test]
fn import_templates_parses_times_and_default_capacity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("templates.csv");
    fs::write(
        &path,
        "market,start,end,capacity\navl,06:00,14:00,3\navl,22:00,02:00,\n",
    )
    .unwrap();

    let rows = import_templates_csv(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].capacity, 3);
    assert_eq!(rows[1].start, hm("22:00"));
    assert_eq!(rows[1].capacity, 1);

    fs::write(&path, "market,start,end\navl,6:00,14:00\n").unwrap();
    assert!(import_templates_csv(&path).is_err());
}

fn sample_ledger() -> Ledger {
    let mut ledger = Ledger::new();
    ledger.add_market("avl", "Asheville").unwrap();
    ledger.add_market("tto", "Toronto").unwrap();
    for (id, name, market) in [
        ("d1", "Bob", "avl"),
        ("d2", "Alice", "avl"),
        ("d3", "Carol", "avl"),
        ("d4", "Dan", "tto"),
    ] {
        ledger
            .register_driver(Driver::new(DriverId::new(id), name, market).with_priority(1))
            .unwrap();
    }
    let day = ledger.add_template("avl", hm("06:00"), hm("14:00"), 3).unwrap();
    let night = ledger.add_template("avl", hm("22:00"), hm("02:00"), 2).unwrap();
    let office = ledger.add_template("tto", hm("09:00"), hm("17:00"), 2).unwrap();

    let monday = date(2024, 6, 10);
    let now = at(date(2024, 6, 9), 9, 0);
    ledger.claim(&DriverId::new("d1"), &day, monday, now).unwrap();
    ledger.claim(&DriverId::new("d2"), &day, monday, now).unwrap();
    ledger.claim(&DriverId::new("d3"), &night, monday, now).unwrap();
    ledger.claim(&DriverId::new("d4"), &office, monday, now).unwrap();
    ledger.claim(&DriverId::new("d4"), &office, date(2024, 6, 11), now).unwrap();
    ledger
}

#[test]
fn digest_groups_by_market_and_slot() {
    let ledger = sample_ledger();
    let digest = prepare_digest(&ledger, date(2024, 6, 10));
    assert_eq!(digest.markets.len(), 2);
    assert_eq!(digest.markets[0].slots[0].label(), "6:00AM - 2:00PM");

    let text = TextDigest.render(&digest);
    insta::assert_snapshot!(text, @r"
    Driver schedule - Monday 2024-06-10

    [AVL]
    6:00AM - 2:00PM: Alice, Bob
    10:00PM - 2:00AM: Carol

    [TTO]
    9:00AM - 5:00PM: Dan
    ");
}

#[test]
fn empty_digest_says_so() {
    let ledger = sample_ledger();
    let digest = prepare_digest(&ledger, date(2024, 6, 12));
    assert!(digest.is_empty());
    let text = TextDigest.render(&digest);
    assert_eq!(
        text,
        "Driver schedule - Wednesday 2024-06-12\n\nNo drivers scheduled.\n"
    );
}

#[test]
fn export_bookings_csv_joins_template_hours() {
    let ledger = sample_ledger();
    let dir = tempdir().unwrap();
    let path = dir.path().join("bookings.csv");
    export_bookings_csv(&path, &ledger).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("id,driver_id,template_id,market,date,start,end")
    );
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 5);
    assert!(rows
        .iter()
        .any(|r| r.contains(",d3,") && r.ends_with(",avl,2024-06-10,22:00,02:00")));
    assert!(rows.last().unwrap().contains("2024-06-11"));
}

#[test]
fn export_capacities_csv_lists_full_week() {
    let mut ledger = sample_ledger();
    let day = ledger.templates()[0].id.clone();
    ledger.set_override(&day, 0, 7).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("capacities.csv");
    export_capacities_csv(&path, &ledger, "AVL").unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let rows: Vec<&str> = content.lines().skip(1).collect();
    assert_eq!(rows.len(), 14);
    assert_eq!(rows[0], format!("{},06:00,14:00,0,7,true", day.as_str()));
    assert_eq!(rows[1], format!("{},06:00,14:00,1,3,false", day.as_str()));
}
