//! ID-card signal extraction and decision.
//!
//! Three independent signals must agree before a scan is trusted:
//!
//! - **keyword**: one of the organization's validation keywords is printed
//!   on the card,
//! - **roll number**: a standalone digit run of the configured length that
//!   is on the organization's roster,
//! - **name**: a 4-character window of that student's name.
//!
//! [`SignalExtractor`] decides what fired on one OCR read and
//! [`SignalMemory`] decides whether enough fired recently.

mod extractor;
mod memory;
mod roster;

pub use extractor::{Observation, ProfileError, ScanProfile, SignalExtractor};
pub use memory::{Decision, LiveSignals, SignalMemory, DEFAULT_RECENCY_WINDOW};
pub use roster::{name_grams, Roster, RosterEntry, NAME_GRAM_LEN};
