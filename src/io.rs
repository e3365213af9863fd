use crate::ledger::Ledger;
use crate::model::{Driver, DriverId};
use crate::time_range::ClockTime;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Ligne de template importée, avant insertion dans un ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRow {
    pub market: String,
    pub start: ClockTime,
    pub end: ClockTime,
    pub capacity: u8,
}

/// Import de chauffeurs depuis CSV: header `id,name,market[,priority][,blocked]`
pub fn import_drivers_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Driver>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let id = rec.get(0).context("missing id")?.trim();
        let name = rec.get(1).context("missing name")?.trim();
        let market = rec.get(2).context("missing market")?.trim();
        if id.is_empty() || name.is_empty() || market.is_empty() {
            bail!("invalid driver row (empty)");
        }
        let mut driver = Driver::new(DriverId::new(id), name, market);
        if let Some(raw) = rec.get(3).map(str::trim).filter(|s| !s.is_empty()) {
            driver.priority = raw
                .parse()
                .with_context(|| format!("invalid priority for driver {id}"))?;
        }
        if let Some(flag) = rec.get(4).map(str::trim).filter(|s| !s.is_empty()) {
            driver.blocked =
                parse_bool(flag).with_context(|| format!("invalid blocked value for driver {id}"))?;
        }
        out.push(driver);
    }
    Ok(out)
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

/// Import de templates: header `market,start,end[,capacity]` (HH:MM, capacité 1 par défaut)
pub fn import_templates_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<TemplateRow>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let market = rec.get(0).context("missing market")?.trim().to_string();
        let start: ClockTime = rec.get(1).context("missing start")?.trim().parse()?;
        let end: ClockTime = rec.get(2).context("missing end")?.trim().parse()?;
        let capacity = match rec.get(3).map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid capacity for template {start}-{end}"))?,
            None => 1,
        };
        out.push(TemplateRow {
            market,
            start,
            end,
            capacity,
        });
    }
    Ok(out)
}

/// Export JSON du ledger (jolie mise en forme)
pub fn export_ledger_json<P: AsRef<Path>>(path: P, ledger: &Ledger) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(ledger)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV des réservations: header `id,driver_id,template_id,market,date,start,end`
pub fn export_bookings_csv<P: AsRef<Path>>(path: P, ledger: &Ledger) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "id",
        "driver_id",
        "template_id",
        "market",
        "date",
        "start",
        "end",
    ])?;
    let mut bookings: Vec<_> = ledger.bookings().iter().collect();
    bookings.sort_by_key(|b| b.date);
    for b in bookings {
        let template = ledger.find_template(&b.template_id);
        let market = template.map(|t| t.market.as_str()).unwrap_or("");
        let start = template.map(|t| t.start.to_string()).unwrap_or_default();
        let end = template.map(|t| t.end.to_string()).unwrap_or_default();
        let date = b.date.format("%Y-%m-%d").to_string();
        w.write_record([
            b.id.as_str(),
            b.driver_id.as_str(),
            b.template_id.as_str(),
            market,
            date.as_str(),
            start.as_str(),
            end.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV de la semaine de capacités d'un marché:
/// header `template_id,start,end,day_of_week,capacity,is_override`
pub fn export_capacities_csv<P: AsRef<Path>>(
    path: P,
    ledger: &Ledger,
    market: &str,
) -> anyhow::Result<()> {
    let market = market.trim().to_ascii_lowercase();
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "template_id",
        "start",
        "end",
        "day_of_week",
        "capacity",
        "is_override",
    ])?;
    let mut dow_buf = itoa::Buffer::new();
    let mut cap_buf = itoa::Buffer::new();
    for t in ledger.templates().iter().filter(|t| t.market == market) {
        let start = t.start.to_string();
        let end = t.end.to_string();
        for day in ledger.week_capacities(&t.id)? {
            w.write_record([
                t.id.as_str(),
                start.as_str(),
                end.as_str(),
                dow_buf.format(day.day_of_week),
                cap_buf.format(day.capacity),
                if day.is_override { "true" } else { "false" },
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}
