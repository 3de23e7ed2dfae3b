//! Reading stored profiles
//!
//! Two separate steps: `parse` decides whether the raw value is usable at
//! all, `repair` turns a usable but possibly incomplete value into a full
//! `Profile` and reports what it had to fix.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;

use super::model::{AttemptEntry, Profile};
use crate::error::ParseError;

/// A stored profile whose members have not been validated yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredProfile {
    pub started_at: Option<Value>,
    pub attempts: Option<Value>,
    pub total_cases: Option<Value>,
    pub correct_cases: Option<Value>,
}

/// Parse a raw stored value. Fails only when the value is not a JSON object.
pub fn parse(raw: &str) -> Result<StoredProfile, ParseError> {
    let value: Value = serde_json::from_str(raw)?;
    let mut object = match value {
        Value::Object(map) => map,
        Value::Null => return Err(ParseError::NotAnObject("null")),
        Value::Bool(_) => return Err(ParseError::NotAnObject("a boolean")),
        Value::Number(_) => return Err(ParseError::NotAnObject("a number")),
        Value::String(_) => return Err(ParseError::NotAnObject("a string")),
        Value::Array(_) => return Err(ParseError::NotAnObject("an array")),
    };

    Ok(StoredProfile {
        started_at: take_present(&mut object, "startedAt"),
        attempts: take_present(&mut object, "attempts"),
        total_cases: take_present(&mut object, "totalCases"),
        correct_cases: take_present(&mut object, "correctCases"),
    })
}

/// `null` counts as absent
fn take_present(object: &mut Map<String, Value>, key: &str) -> Option<Value> {
    object.remove(key).filter(|v| !v.is_null())
}

/// Something `repair` had to fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    MissingAttempts,
    AttemptsNotSequence,
    /// Entries of the attempt list that could not be read; they are kept
    /// as stored
    UnreadableAttempts(usize),
    MissingStartedAt,
    InvalidStartedAt,
    /// Counter absent or not a non-negative integer; reset to zero
    MissingCounter(&'static str),
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drift::MissingAttempts => write!(f, "attempts missing"),
            Drift::AttemptsNotSequence => write!(f, "attempts is not a list"),
            Drift::UnreadableAttempts(n) => write!(f, "{} unreadable attempts kept as stored", n),
            Drift::MissingStartedAt => write!(f, "startedAt missing"),
            Drift::InvalidStartedAt => write!(f, "startedAt unreadable"),
            Drift::MissingCounter(field) => write!(f, "{} missing", field),
        }
    }
}

/// Result of repairing a stored profile
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    pub profile: Profile,
    pub drift: Vec<Drift>,
}

impl Repaired {
    /// Nothing needed fixing
    pub fn is_clean(&self) -> bool {
        self.drift.is_empty()
    }
}

/// Fill gaps in a parsed profile. `now` stands in for a missing start time.
pub fn repair(stored: StoredProfile, now: DateTime<Utc>) -> Repaired {
    let mut drift = Vec::new();

    let attempts = match stored.attempts {
        None => {
            drift.push(Drift::MissingAttempts);
            Vec::new()
        }
        Some(Value::Array(items)) => {
            let attempts: Vec<AttemptEntry> = items.into_iter().map(AttemptEntry::from_value).collect();
            let unreadable = attempts.iter().filter(|entry| entry.attempt().is_none()).count();
            if unreadable > 0 {
                drift.push(Drift::UnreadableAttempts(unreadable));
            }
            attempts
        }
        Some(_) => {
            drift.push(Drift::AttemptsNotSequence);
            Vec::new()
        }
    };

    let started_at = match stored.started_at {
        None => {
            drift.push(Drift::MissingStartedAt);
            now
        }
        Some(value) => match serde_json::from_value::<DateTime<Utc>>(value) {
            Ok(ts) => ts,
            Err(_) => {
                drift.push(Drift::InvalidStartedAt);
                now
            }
        },
    };

    let total_cases = counter(stored.total_cases, "totalCases", &mut drift);
    let correct_cases = counter(stored.correct_cases, "correctCases", &mut drift);

    Repaired {
        profile: Profile {
            started_at,
            attempts,
            total_cases,
            correct_cases,
        },
        drift,
    }
}

fn counter(value: Option<Value>, field: &'static str, drift: &mut Vec<Drift>) -> u64 {
    match value.as_ref().and_then(Value::as_u64) {
        Some(n) => n,
        None => {
            drift.push(Drift::MissingCounter(field));
            0
        }
    }
}
