//! Relational table dump of the habit store.
//!
//! Writes `habits.csv` and `completions.csv` with the same columns as the
//! `habits` and `completions` tables, so the data can be bulk-loaded into a
//! relational database. Each file is written to a temp file, synced and
//! renamed into place.

use crate::store::{HabitStore, Tables};
use crate::{Completion, Error, Habit, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const HABIT_COLUMNS: [&str; 5] = ["id", "name", "frequency", "start_date", "created_at"];
const COMPLETION_COLUMNS: [&str; 4] = ["id", "habit_id", "date_completed", "created_at"];

/// A row of `habits.csv`
#[derive(Debug, Serialize)]
struct HabitRow {
    id: u64,
    name: String,
    frequency: &'static str,
    start_date: String,
    created_at: String,
}

impl From<&Habit> for HabitRow {
    fn from(habit: &Habit) -> Self {
        HabitRow {
            id: habit.id.0,
            name: habit.name.clone(),
            frequency: habit.frequency.as_str(),
            start_date: habit.start_date.format("%Y-%m-%d").to_string(),
            created_at: habit.created_at.to_rfc3339(),
        }
    }
}

/// A row of `completions.csv`
#[derive(Debug, Serialize)]
struct CompletionRow {
    id: u64,
    habit_id: u64,
    date_completed: String,
    created_at: String,
}

impl From<&Completion> for CompletionRow {
    fn from(completion: &Completion) -> Self {
        CompletionRow {
            id: completion.id.0,
            habit_id: completion.habit_id.0,
            date_completed: completion.date_completed.format("%Y-%m-%d").to_string(),
            created_at: completion.created_at.to_rfc3339(),
        }
    }
}

/// Files written by [`dump_tables`]
#[derive(Debug, Clone)]
pub struct TableDump {
    pub habits_path: PathBuf,
    pub completions_path: PathBuf,
    pub habit_rows: usize,
    pub completion_rows: usize,
}

/// Dump both tables of `store` as CSV files into `out_dir`
///
/// Existing dump files in `out_dir` are replaced.
pub fn dump_tables(store: &HabitStore, out_dir: &Path) -> Result<TableDump> {
    let tables = store.snapshot()?;
    write_tables(&tables, out_dir)
}

fn write_tables(tables: &Tables, out_dir: &Path) -> Result<TableDump> {
    std::fs::create_dir_all(out_dir)?;

    let habits_path = out_dir.join("habits.csv");
    write_csv(
        &habits_path,
        out_dir,
        &HABIT_COLUMNS,
        tables.habits.iter().map(HabitRow::from),
    )?;

    // Completions ordered by id, matching insertion order in a database
    let mut completions: Vec<&Completion> = tables.completions.iter().collect();
    completions.sort_by_key(|c| c.id);
    let completions_path = out_dir.join("completions.csv");
    write_csv(
        &completions_path,
        out_dir,
        &COMPLETION_COLUMNS,
        completions.into_iter().map(CompletionRow::from),
    )?;

    tracing::info!(
        "Dumped {} habits and {} completions to {:?}",
        tables.habits.len(),
        tables.completions.len(),
        out_dir
    );

    Ok(TableDump {
        habits_path,
        completions_path,
        habit_rows: tables.habits.len(),
        completion_rows: tables.completions.len(),
    })
}

fn write_csv<R, I>(path: &Path, dir: &Path, columns: &[&str], rows: I) -> Result<()>
where
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let temp = NamedTempFile::new_in(dir)?;

    {
        // Header written by hand so empty tables still get one
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(temp.as_file());
        writer.write_record(columns)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}
