//! Learning profile data and its stored form

pub mod model;
pub mod parse;

pub use model::{Attempt, AttemptEntry, BasicStats, CaseId, Label, Profile};
pub use parse::{parse, repair, Drift, Repaired, StoredProfile};
