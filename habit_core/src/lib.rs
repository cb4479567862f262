#![forbid(unsafe_code)]

//! Core domain model and business logic for the habit tracker.
//!
//! This crate provides:
//! - Domain types (habits, completions, validated input)
//! - Habit store (locked, atomically saved JSON tables)
//! - Statistics (streaks, completion rate, dashboard summary)
//! - Relational table dump (CSV)
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod stats;
pub mod store;
pub mod tables;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use stats::{
    completion_percentage, current_streak, is_completed_today, longest_streak, Dashboard,
    HabitStats, HabitSummary,
};
pub use store::HabitStore;
pub use tables::{dump_tables, TableDump};
