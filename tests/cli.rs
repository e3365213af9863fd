#![forbid(unsafe_code)]
use assert_cmd::Command;
use chrono::{Duration, Local};
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn cli(ledger: &Path) -> Command {
    let mut cmd = Command::cargo_bin("shiftclaim-cli").unwrap();
    cmd.arg("--ledger").arg(ledger).arg("--tz").arg("local");
    cmd
}

fn stdout_line(cmd: &mut Command) -> String {
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).unwrap().trim().to_string()
}

#[test]
fn claim_then_reject_duplicate_and_out_of_window() {
    let dir = tempdir().unwrap();
    let ledger = dir.path().join("ledger.json");

    cli(&ledger)
        .args(["add-market", "--code", "avl", "--name", "Asheville"])
        .assert()
        .success();
    cli(&ledger)
        .args([
            "add-driver",
            "--id",
            "d1",
            "--name",
            "Alice",
            "--market",
            "avl",
            "--priority",
            "3",
        ])
        .assert()
        .success();
    let template = stdout_line(cli(&ledger).args([
        "add-template",
        "--market",
        "avl",
        "--start",
        "06:00",
        "--end",
        "14:00",
        "--capacity",
        "2",
    ]));
    assert!(!template.is_empty());

    let tomorrow = (Local::now().date_naive() + Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();
    let booking = stdout_line(cli(&ledger).args([
        "claim",
        "--driver",
        "d1",
        "--template",
        &template,
        "--date",
        &tomorrow,
    ]));
    assert!(!booking.is_empty());

    cli(&ledger)
        .args(["claim", "--driver", "d1", "--template", &template, "--date", &tomorrow])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("overlaps_today"));

    // niveau 3 : 7 + 3 = 10 jours
    let far = (Local::now().date_naive() + Duration::days(11))
        .format("%Y-%m-%d")
        .to_string();
    cli(&ledger)
        .args(["claim", "--driver", "d1", "--template", &template, "--date", &far])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("outside_window"));

    cli(&ledger)
        .args(["bookings", "--driver", "d1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(booking.as_str())
                .and(predicate::str::contains("avl 06:00-14:00")),
        );

    cli(&ledger)
        .args(["cancel", "--booking", &booking, "--admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"));
}

#[test]
fn settings_are_validated() {
    let dir = tempdir().unwrap();
    let ledger = dir.path().join("ledger.json");

    cli(&ledger)
        .args(["settings", "--base-days", "31"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("baseScheduleDays must be 1-30"));

    cli(&ledger)
        .args(["settings", "--base-days", "14", "--cancel-hours", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base_schedule_days=14 cancel_hours_before=12"));
}

#[test]
fn malformed_time_is_reported() {
    let dir = tempdir().unwrap();
    let ledger = dir.path().join("ledger.json");
    cli(&ledger)
        .args(["add-market", "--code", "avl", "--name", "Asheville"])
        .assert()
        .success();
    cli(&ledger)
        .args(["add-template", "--market", "avl", "--start", "6:00", "--end", "14:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid time format"));
}

#[test]
fn unknown_time_zone_is_rejected() {
    let dir = tempdir().unwrap();
    let ledger = dir.path().join("ledger.json");
    Command::cargo_bin("shiftclaim-cli")
        .unwrap()
        .arg("--ledger")
        .arg(&ledger)
        .args(["--tz", "Mars/Olympus", "settings"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown time zone"));
}

#[test]
fn admin_edits_templates_drivers_and_markets() {
    let dir = tempdir().unwrap();
    let ledger = dir.path().join("ledger.json");
    for code in ["avl", "tto"] {
        cli(&ledger)
            .args(["add-market", "--code", code, "--name", code])
            .assert()
            .success();
    }
    cli(&ledger)
        .args(["add-driver", "--id", "d1", "--name", "Alice", "--market", "avl"])
        .assert()
        .success();
    let template = stdout_line(cli(&ledger).args([
        "add-template",
        "--market",
        "avl",
        "--start",
        "06:00",
        "--end",
        "14:00",
    ]));

    cli(&ledger)
        .args(["template-times", "--template", &template, "--start", "07:30"])
        .assert()
        .success();
    cli(&ledger)
        .args(["template-times", "--template", &template, "--end", "25:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid time format"));
    cli(&ledger)
        .args(["availability", "--market", "avl", "--date", "2024-06-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("07:30-14:00"));

    cli(&ledger)
        .args(["remove-market", "--code", "avl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot delete market avl"));
    cli(&ledger)
        .args(["edit-driver", "--driver", "d1", "--name", "Alicia", "--market", "tto"])
        .assert()
        .success();
    cli(&ledger)
        .args(["remove-market", "--code", "tto"])
        .assert()
        .failure();
    cli(&ledger)
        .args(["add-market", "--code", "clt", "--name", "Charlotte"])
        .assert()
        .success();
    cli(&ledger)
        .args(["remove-market", "--code", "clt"])
        .assert()
        .success();
}
