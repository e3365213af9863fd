#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shiftclaim::{
    config::{EngineConfig, ZonePolicy},
    digest::{prepare_digest, DigestRenderer, TextDigest},
    io,
    ledger::LedgerError,
    model::{BookingId, Driver, DriverId, TemplateId},
    storage::{JsonStorage, Storage},
    time_range::ClockTime,
    RejectReason,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de réservation de créneaux chauffeurs
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du ledger
    #[arg(long, global = true, default_value = "ledger.json")]
    ledger: String,

    /// Configuration JSON (table des bonus de priorité, fuseau)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Fuseau de référence ("local" ou nom IANA), prioritaire sur la config
    #[arg(long, global = true)]
    tz: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Déclarer un marché
    AddMarket {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
    },

    /// Activer / désactiver un marché
    MarketStatus {
        #[arg(long)]
        code: String,
        #[arg(long)]
        inactive: bool,
    },

    /// Supprimer un marché sans chauffeur ni template
    RemoveMarket {
        #[arg(long)]
        code: String,
    },

    /// Enregistrer un chauffeur
    AddDriver {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        market: String,
        #[arg(long, default_value_t = 5)]
        priority: u8,
    },

    /// Importer des chauffeurs depuis un CSV
    ImportDrivers {
        #[arg(long)]
        csv: String,
    },

    /// Renommer un chauffeur ou changer son marché
    EditDriver {
        #[arg(long)]
        driver: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        market: Option<String>,
    },

    /// Bloquer (ou débloquer) un chauffeur
    Block {
        #[arg(long)]
        driver: String,
        #[arg(long)]
        unblock: bool,
    },

    /// Changer la priorité d'un chauffeur (1-5)
    Priority {
        #[arg(long)]
        driver: String,
        #[arg(long)]
        level: u8,
    },

    /// Créer un template de créneau
    AddTemplate {
        #[arg(long)]
        market: String,
        /// HH:MM
        #[arg(long)]
        start: String,
        /// HH:MM (inférieur au début : créneau de nuit)
        #[arg(long)]
        end: String,
        #[arg(long, default_value_t = 1)]
        capacity: u8,
    },

    /// Importer des templates depuis un CSV
    ImportTemplates {
        #[arg(long)]
        csv: String,
    },

    /// Modifier les horaires d'un template (HH:MM)
    TemplateTimes {
        #[arg(long)]
        template: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// Modifier la capacité par défaut d'un template
    Capacity {
        #[arg(long)]
        template: String,
        #[arg(long)]
        value: u8,
    },

    /// Supprimer un template sans réservation à venir
    RemoveTemplate {
        #[arg(long)]
        template: String,
    },

    /// Exception de capacité pour un jour de semaine (0 = dimanche ; capacité 0 = retrait)
    Override {
        #[arg(long)]
        template: String,
        #[arg(long)]
        day: u8,
        #[arg(long)]
        capacity: u8,
    },

    /// Retirer toutes les exceptions d'un template
    ClearOverrides {
        #[arg(long)]
        template: String,
    },

    /// Capacités effectives de la semaine pour un template
    Week {
        #[arg(long)]
        template: String,
    },

    /// Disponibilités d'un marché pour une date
    Availability {
        #[arg(long)]
        market: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// Réserver un créneau
    Claim {
        #[arg(long)]
        driver: String,
        #[arg(long)]
        template: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// Annuler une réservation
    Cancel {
        #[arg(long)]
        booking: String,
        /// Ignore le préavis d'annulation
        #[arg(long)]
        admin: bool,
    },

    /// Retrait administratif d'une réservation
    RemoveBooking {
        #[arg(long)]
        booking: String,
    },

    /// Lister les réservations d'un chauffeur
    Bookings {
        #[arg(long)]
        driver: String,
    },

    /// Afficher ou modifier les réglages
    Settings {
        #[arg(long)]
        base_days: Option<u32>,
        #[arg(long)]
        cancel_hours: Option<u32>,
        #[arg(long)]
        show_spots: Option<bool>,
    },

    /// Planning du jour (texte brut)
    Digest {
        /// YYYY-MM-DD (aujourd'hui par défaut)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        out: Option<String>,
    },

    /// Exporter le ledger
    Export {
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
        /// Semaine de capacités d'un marché (CSV)
        #[arg(long, requires = "market")]
        out_capacities: Option<String>,
        #[arg(long)]
        market: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let zone = match &cli.tz {
        Some(name) => ZonePolicy::parse(name)?,
        None => config.zone()?,
    };

    let storage = JsonStorage::open(&cli.ledger)?;
    let mut ledger = storage
        .load_or_default()?
        .with_policy(config.policy.clone())
        .with_zone(zone);
    let now = zone.now();
    let today = now.date();

    let code = match cli.cmd {
        Commands::AddMarket { code, name } => {
            ledger.add_market(&code, &name)?;
            storage.save(&ledger)?;
            0
        }
        Commands::MarketStatus { code, inactive } => {
            ledger.set_market_active(&code, !inactive)?;
            storage.save(&ledger)?;
            0
        }
        Commands::RemoveMarket { code } => {
            ledger.remove_market(&code)?;
            storage.save(&ledger)?;
            0
        }
        Commands::AddDriver {
            id,
            name,
            market,
            priority,
        } => {
            ledger.register_driver(Driver::new(DriverId::new(id), name, market).with_priority(priority))?;
            storage.save(&ledger)?;
            0
        }
        Commands::ImportDrivers { csv } => {
            for driver in io::import_drivers_csv(csv)? {
                let id = driver.id.clone();
                ledger
                    .register_driver(driver)
                    .with_context(|| format!("importing driver {id}"))?;
            }
            storage.save(&ledger)?;
            0
        }
        Commands::EditDriver {
            driver,
            name,
            market,
        } => {
            ledger.update_driver(&DriverId::new(driver), name.as_deref(), market.as_deref())?;
            storage.save(&ledger)?;
            0
        }
        Commands::Block { driver, unblock } => {
            ledger.set_driver_blocked(&DriverId::new(driver), !unblock)?;
            storage.save(&ledger)?;
            0
        }
        Commands::Priority { driver, level } => {
            ledger.set_driver_priority(&DriverId::new(driver), level)?;
            storage.save(&ledger)?;
            0
        }
        Commands::AddTemplate {
            market,
            start,
            end,
            capacity,
        } => {
            let start: ClockTime = start.parse()?;
            let end: ClockTime = end.parse()?;
            let id = ledger.add_template(&market, start, end, capacity)?;
            storage.save(&ledger)?;
            println!("{id}");
            0
        }
        Commands::ImportTemplates { csv } => {
            for row in io::import_templates_csv(csv)? {
                let id = ledger
                    .add_template(&row.market, row.start, row.end, row.capacity)
                    .with_context(|| format!("importing template {}-{}", row.start, row.end))?;
                println!("{id}");
            }
            storage.save(&ledger)?;
            0
        }
        Commands::TemplateTimes {
            template,
            start,
            end,
        } => {
            let start = start.map(|raw| raw.parse::<ClockTime>()).transpose()?;
            let end = end.map(|raw| raw.parse::<ClockTime>()).transpose()?;
            ledger.update_template_times(&TemplateId::new(template), start, end)?;
            storage.save(&ledger)?;
            0
        }
        Commands::Capacity { template, value } => {
            ledger.update_template_capacity(&TemplateId::new(template), value, today)?;
            storage.save(&ledger)?;
            0
        }
        Commands::RemoveTemplate { template } => {
            ledger.remove_template(&TemplateId::new(template), today)?;
            storage.save(&ledger)?;
            0
        }
        Commands::Override {
            template,
            day,
            capacity,
        } => {
            ledger.set_override(&TemplateId::new(template), day, capacity)?;
            storage.save(&ledger)?;
            0
        }
        Commands::ClearOverrides { template } => {
            ledger.clear_overrides(&TemplateId::new(template))?;
            storage.save(&ledger)?;
            0
        }
        Commands::Week { template } => {
            for day in ledger.week_capacities(&TemplateId::new(template))? {
                let marker = if day.is_override { " (override)" } else { "" };
                println!("{:<9} {}{}", day.day_name, day.capacity, marker);
            }
            0
        }
        Commands::Availability { market, date } => {
            let date = parse_date(&date)?;
            let show_spots = ledger.settings().show_available_spots();
            for shift in ledger.availability(&market, date) {
                let names: Vec<&str> = shift.drivers.iter().map(|d| d.name.as_str()).collect();
                if show_spots {
                    println!(
                        "{} | {}-{} | {}/{} booked, {} open | {}",
                        shift.template_id,
                        shift.start,
                        shift.end,
                        shift.booked,
                        shift.capacity,
                        shift.available,
                        names.join(", ")
                    );
                } else {
                    println!(
                        "{} | {}-{} | {}",
                        shift.template_id,
                        shift.start,
                        shift.end,
                        if shift.available > 0 { "open" } else { "full" }
                    );
                }
            }
            0
        }
        Commands::Claim {
            driver,
            template,
            date,
        } => {
            let date = parse_date(&date)?;
            match ledger.claim(&DriverId::new(driver), &TemplateId::new(template), date, now) {
                Ok(booking) => {
                    storage.save(&ledger)?;
                    println!("{}", booking.id);
                    0
                }
                Err(LedgerError::Rejected(reason)) => report_rejection(reason),
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Cancel { booking, admin } => {
            match ledger.cancel(&BookingId::new(booking), now, admin) {
                Ok(removed) => {
                    storage.save(&ledger)?;
                    println!("cancelled {}", removed.id);
                    0
                }
                Err(LedgerError::Rejected(reason)) => report_rejection(reason),
                Err(err) => return Err(err.into()),
            }
        }
        Commands::RemoveBooking { booking } => {
            ledger.remove_booking(&BookingId::new(booking))?;
            storage.save(&ledger)?;
            0
        }
        Commands::Bookings { driver } => {
            for b in ledger.bookings_for_driver(&DriverId::new(driver)) {
                let range = ledger
                    .find_template(&b.template_id)
                    .map(|t| format!("{} {}", t.market, t.range()))
                    .unwrap_or_else(|| "-".to_string());
                println!("{} | {} | {}", b.id, b.date, range);
            }
            0
        }
        Commands::Settings {
            base_days,
            cancel_hours,
            show_spots,
        } => {
            if base_days.is_some() || cancel_hours.is_some() || show_spots.is_some() {
                ledger.update_settings(base_days, cancel_hours, show_spots)?;
                storage.save(&ledger)?;
            }
            let s = ledger.settings();
            println!(
                "base_schedule_days={} cancel_hours_before={} show_available_spots={}",
                s.base_schedule_days(),
                s.cancel_hours_before(),
                s.show_available_spots()
            );
            0
        }
        Commands::Digest { date, out } => {
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => today,
            };
            let text = TextDigest.render(&prepare_digest(&ledger, date));
            match out {
                Some(path) => std::fs::write(&path, text).with_context(|| format!("writing {path}"))?,
                None => print!("{text}"),
            }
            0
        }
        Commands::Export {
            out_json,
            out_csv,
            out_capacities,
            market,
        } => {
            if let Some(path) = out_json {
                io::export_ledger_json(path, &ledger)?;
            }
            if let Some(path) = out_csv {
                io::export_bookings_csv(path, &ledger)?;
            }
            if let (Some(path), Some(market)) = (out_capacities, market) {
                io::export_capacities_csv(path, &ledger, &market)?;
            }
            0
        }
    };

    std::process::exit(code);
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

// Code 2 = refus métier
fn report_rejection(reason: RejectReason) -> i32 {
    eprintln!("rejected: {reason} ({})", reason.code());
    2
}
