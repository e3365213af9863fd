use crate::ledger::Ledger;
use crate::time_range::ClockTime;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Planning d'une journée, groupé par marché puis par créneau.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyDigest {
    pub date: NaiveDate,
    pub markets: Vec<MarketDigest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketDigest {
    pub market: String,
    pub slots: Vec<SlotDigest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDigest {
    pub start: ClockTime,
    pub end: ClockTime,
    pub drivers: Vec<String>,
}

impl SlotDigest {
    /// Libellé 12 h : `9:00AM - 5:00PM`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.start.to_12h(), self.end.to_12h())
    }
}

impl DailyDigest {
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

/// Permet de customiser le rendu (texte, blocs de messagerie, etc.).
pub trait DigestRenderer {
    fn render(&self, digest: &DailyDigest) -> String;
}

/// Rendu texte brut.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextDigest;

impl DigestRenderer for TextDigest {
    fn render(&self, digest: &DailyDigest) -> String {
        let mut out = format!(
            "Driver schedule - {} {}\n",
            Ledger::weekday_of(digest.date),
            digest.date.format("%Y-%m-%d")
        );
        if digest.is_empty() {
            out.push_str("\nNo drivers scheduled.\n");
            return out;
        }
        for market in &digest.markets {
            out.push_str(&format!("\n[{}]\n", market.market.to_ascii_uppercase()));
            for slot in &market.slots {
                out.push_str(&format!("{}: {}\n", slot.label(), slot.drivers.join(", ")));
            }
        }
        out
    }
}

/// Construit le planning du jour ; marchés par code, créneaux par heure de début.
pub fn prepare_digest(ledger: &Ledger, date: NaiveDate) -> DailyDigest {
    let mut grouped: BTreeMap<String, BTreeMap<(ClockTime, ClockTime), Vec<String>>> =
        BTreeMap::new();

    for booking in ledger.bookings_on(date) {
        let Some(template) = ledger.find_template(&booking.template_id) else {
            continue;
        };
        let name = ledger
            .find_driver(&booking.driver_id)
            .map_or_else(|| booking.driver_id.to_string(), |d| d.name.clone());
        grouped
            .entry(template.market.clone())
            .or_default()
            .entry((template.start, template.end))
            .or_default()
            .push(name);
    }

    let markets = grouped
        .into_iter()
        .map(|(market, slots)| MarketDigest {
            market,
            slots: slots
                .into_iter()
                .map(|((start, end), mut drivers)| {
                    drivers.sort();
                    SlotDigest {
                        start,
                        end,
                        drivers,
                    }
                })
                .collect(),
        })
        .collect();

    DailyDigest { date, markets }
}
