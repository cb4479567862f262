//! Core domain types for the habit tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Habit and completion records (the two persisted tables)
//! - Validated habit input
//! - Outcomes of completion toggling

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum habit name length, in characters
pub const MAX_NAME_LEN: usize = 100;

// ============================================================================
// Identifiers
// ============================================================================

/// Primary key of a row in the `habits` table
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(pub u64);

/// Primary key of a row in the `completions` table
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionId(pub u64);

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CompletionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HabitId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(HabitId)
            .map_err(|_| Error::Validation(format!("Invalid habit id: {}", s)))
    }
}

// ============================================================================
// Habit Types
// ============================================================================

/// Declared repetition unit of a habit
///
/// Streak math treats both cadences as daily.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            _ => Err(Error::Validation(format!(
                "Invalid frequency '{}': expected daily or weekly",
                s
            ))),
        }
    }
}

/// A habit row
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating or updating a habit
#[derive(Clone, Debug, PartialEq)]
pub struct HabitDraft {
    name: String,
    frequency: Frequency,
    start_date: NaiveDate,
}

impl HabitDraft {
    /// Build a draft, rejecting empty or overlong names
    pub fn new(name: impl Into<String>, frequency: Frequency, start_date: NaiveDate) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            frequency,
            start_date,
        })
    }

    /// Build a draft from free-text input (frequency given as text)
    pub fn parse(name: impl Into<String>, frequency: &str, start_date: NaiveDate) -> Result<Self> {
        let frequency = frequency.parse::<Frequency>()?;
        Self::new(name, frequency, start_date)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }
}

/// Check a habit name: required, at most [`MAX_NAME_LEN`] characters
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("Habit name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "Habit name must be between 1 and {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

// ============================================================================
// Completion Types
// ============================================================================

/// A completion row: the habit was performed on `date_completed`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Completion {
    pub id: CompletionId,
    pub habit_id: HabitId,
    pub date_completed: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Result of marking a habit done for a date
#[derive(Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    /// A new completion was stored
    Completed(Completion),
    /// A completion for that date already existed; nothing was stored
    AlreadyCompleted,
}

/// Result of removing the completion for a date
#[derive(Clone, Debug, PartialEq)]
pub enum UnmarkOutcome {
    /// The completion was deleted
    Removed(Completion),
    /// No completion existed for that date
    NotFound,
}
