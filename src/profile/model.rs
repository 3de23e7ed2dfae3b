//! Profile and attempt records
//!
//! Field names are serialized in camelCase and instants as RFC 3339
//! strings, which is the persisted wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Accepts strings, numbers, booleans and `null`, keeping the text form of
/// scalars. Older stored profiles were not strict about identifier types,
/// and unanswered selections were stored as `null`.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        UInt(u64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::UInt(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
        Raw::Bool(b) => b.to_string(),
    }))
}

/// Opaque identifier of a practice case. `None` is a stored `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(#[serde(deserialize_with = "lenient_text")] Option<String>);

impl CaseId {
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or("null"))
    }
}

impl From<&str> for CaseId {
    fn from(s: &str) -> Self {
        CaseId(Some(s.to_string()))
    }
}

impl From<String> for CaseId {
    fn from(s: String) -> Self {
        CaseId(Some(s))
    }
}

impl From<u64> for CaseId {
    fn from(n: u64) -> Self {
        CaseId(Some(n.to_string()))
    }
}

/// A selectable answer value; compared by exact equality.
///
/// An unanswered selection is `Label::none()` and is stored as `null`; two
/// unanswered selections are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(#[serde(deserialize_with = "lenient_text")] Option<String>);

impl Label {
    pub fn none() -> Self {
        Label(None)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or("null"))
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label(Some(s.to_string()))
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label(Some(s))
    }
}

impl From<Option<String>> for Label {
    fn from(s: Option<String>) -> Self {
        Label(s)
    }
}

/// One recorded practice action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    #[serde(default)]
    pub case_id: CaseId,
    #[serde(default)]
    pub selected_primary: Label,
    #[serde(default)]
    pub selected_comp: Label,
    #[serde(default)]
    pub correct_primary: Label,
    #[serde(default)]
    pub correct_comp: Label,
    /// Both selections matched
    #[serde(default)]
    pub is_correct: bool,
    /// Practice context the attempt was made in
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(alias = "ts")]
    pub timestamp: DateTime<Utc>,
}

impl Attempt {
    /// Build an attempt, deriving `is_correct` from the four labels
    pub fn new(
        case_id: CaseId,
        selected_primary: Label,
        selected_comp: Label,
        correct_primary: Label,
        correct_comp: Label,
        mode: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let is_correct = selected_primary == correct_primary && selected_comp == correct_comp;
        Self {
            case_id,
            selected_primary,
            selected_comp,
            correct_primary,
            correct_comp,
            is_correct,
            mode,
            timestamp,
        }
    }
}

/// One element of the stored attempt list.
///
/// Entries that do not read as an `Attempt` are kept as they were stored
/// and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttemptEntry {
    Recorded(Attempt),
    Unreadable(Value),
}

impl AttemptEntry {
    /// Read one stored list element
    pub fn from_value(value: Value) -> Self {
        match Attempt::deserialize(&value) {
            Ok(attempt) => AttemptEntry::Recorded(attempt),
            Err(_) => AttemptEntry::Unreadable(value),
        }
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        match self {
            AttemptEntry::Recorded(attempt) => Some(attempt),
            AttemptEntry::Unreadable(_) => None,
        }
    }

    /// Case the entry belongs to; unreadable entries count by whatever
    /// `caseId` they carry
    pub fn case_id(&self) -> CaseId {
        match self {
            AttemptEntry::Recorded(attempt) => attempt.case_id.clone(),
            AttemptEntry::Unreadable(value) => value
                .get("caseId")
                .and_then(|id| CaseId::deserialize(id).ok())
                .unwrap_or_default(),
        }
    }
}

impl From<Attempt> for AttemptEntry {
    fn from(attempt: Attempt) -> Self {
        AttemptEntry::Recorded(attempt)
    }
}

/// Durable learning state for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub started_at: DateTime<Utc>,
    /// Chronological, append-only
    pub attempts: Vec<AttemptEntry>,
    pub total_cases: u64,
    pub correct_cases: u64,
}

impl Profile {
    /// Empty profile started at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            attempts: Vec::new(),
            total_cases: 0,
            correct_cases: 0,
        }
    }

    /// Append an attempt and bump the counters
    pub fn record(&mut self, attempt: Attempt) {
        self.total_cases += 1;
        if attempt.is_correct {
            self.correct_cases += 1;
        }
        self.attempts.push(attempt.into());
    }

    /// Attempts that could be read, in order
    pub fn recorded(&self) -> impl Iterator<Item = &Attempt> {
        self.attempts.iter().filter_map(AttemptEntry::attempt)
    }

    /// Aggregate counters; the distinct-case set is rebuilt on every call
    pub fn basic_stats(&self) -> BasicStats {
        let unique: HashSet<CaseId> = self.attempts.iter().map(AttemptEntry::case_id).collect();
        BasicStats {
            total_attempts: self.attempts.len(),
            unique_cases_worked: unique.len(),
            correct_cases: self.correct_cases,
        }
    }

    /// Serialize the whole profile in its persisted form
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Dashboard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicStats {
    pub total_attempts: usize,
    pub unique_cases_worked: usize,
    pub correct_cases: u64,
}
