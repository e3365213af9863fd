//! Moteur de décision : fonctions pures sur un instantané fourni par l'appelant.

mod cancel;
mod capacity;
mod claim;
mod overlap;
mod types;
mod window;

pub use cancel::try_cancel;
pub use capacity::capacity_for_date;
pub use claim::try_claim;
pub use types::{CancelRequest, ClaimRequest, ClaimSnapshot, RejectReason};
pub use window::{window_days, within_window};
