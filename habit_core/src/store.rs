//! Habit store: durable habit and completion tables with file locking.
//!
//! Both tables live in one JSON snapshot (`habits.json`) in the data
//! directory. Each store operation is a single transaction:
//! - readers hold a shared lock on `habits.lock` while loading
//! - writers hold an exclusive lock across load, mutate and save
//! - saves go to a temp file that is synced and renamed over the snapshot
//!
//! Every load re-checks the table constraints (unique ids, no orphaned
//! completions, one completion per habit per day), so a snapshot edited or
//! merged outside the store cannot slip duplicates past the statistics.

use crate::stats::{Dashboard, HabitStats};
use crate::{
    Completion, CompletionId, Error, Habit, HabitDraft, HabitId, MarkOutcome, Result,
    UnmarkOutcome,
};
use chrono::{NaiveDate, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

const SNAPSHOT_FILE: &str = "habits.json";
const LOCK_FILE: &str = "habits.lock";

// ============================================================================
// Tables
// ============================================================================

/// In-memory copy of the `habits` and `completions` tables
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Tables {
    next_habit_id: u64,
    next_completion_id: u64,
    pub habits: Vec<Habit>,
    pub completions: Vec<Completion>,
    #[serde(skip)]
    dirty: bool,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            next_habit_id: 1,
            next_completion_id: 1,
            habits: Vec::new(),
            completions: Vec::new(),
            dirty: false,
        }
    }
}

impl Tables {
    /// Verify the table constraints
    pub fn check_integrity(&self) -> Result<()> {
        let mut habit_ids = HashSet::new();
        for habit in &self.habits {
            if !habit_ids.insert(habit.id) {
                return Err(Error::Constraint(format!("duplicate habit id {}", habit.id)));
            }
            if habit.id.0 >= self.next_habit_id {
                return Err(Error::Constraint(format!(
                    "habit id {} is not below next_habit_id {}",
                    habit.id, self.next_habit_id
                )));
            }
        }

        let mut completion_ids = HashSet::new();
        let mut per_day = HashSet::new();
        for completion in &self.completions {
            if !completion_ids.insert(completion.id) {
                return Err(Error::Constraint(format!(
                    "duplicate completion id {}",
                    completion.id
                )));
            }
            if completion.id.0 >= self.next_completion_id {
                return Err(Error::Constraint(format!(
                    "completion id {} is not below next_completion_id {}",
                    completion.id, self.next_completion_id
                )));
            }
            if !habit_ids.contains(&completion.habit_id) {
                return Err(Error::Constraint(format!(
                    "completion {} references missing habit {}",
                    completion.id, completion.habit_id
                )));
            }
            if !per_day.insert((completion.habit_id, completion.date_completed)) {
                return Err(Error::Constraint(format!(
                    "habit {} has more than one completion on {}",
                    completion.habit_id, completion.date_completed
                )));
            }
        }

        Ok(())
    }

    /// Look up a habit by id
    pub fn habit(&self, id: HabitId) -> Result<&Habit> {
        self.habits
            .iter()
            .find(|h| h.id == id)
            .ok_or_else(|| not_found(id))
    }

    fn habit_mut(&mut self, id: HabitId) -> Result<&mut Habit> {
        self.habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// Completions of one habit, ascending by date
    pub fn completions_for(&self, habit_id: HabitId) -> Vec<&Completion> {
        let mut completions: Vec<&Completion> = self
            .completions
            .iter()
            .filter(|c| c.habit_id == habit_id)
            .collect();
        completions.sort_by_key(|c| c.date_completed);
        completions
    }

    /// Completion dates of one habit, ascending
    pub fn dates_for(&self, habit_id: HabitId) -> Vec<NaiveDate> {
        self.completions_for(habit_id)
            .into_iter()
            .map(|c| c.date_completed)
            .collect()
    }

    fn insert_habit(&mut self, draft: &HabitDraft) -> Habit {
        let habit = Habit {
            id: HabitId(self.next_habit_id),
            name: draft.name().to_string(),
            frequency: draft.frequency(),
            start_date: draft.start_date(),
            created_at: Utc::now(),
        };
        self.next_habit_id += 1;
        self.habits.push(habit.clone());
        self.dirty = true;
        habit
    }

    fn update_habit(&mut self, id: HabitId, draft: &HabitDraft) -> Result<Habit> {
        let habit = self.habit_mut(id)?;
        habit.name = draft.name().to_string();
        habit.frequency = draft.frequency();
        habit.start_date = draft.start_date();
        let updated = habit.clone();
        self.dirty = true;
        Ok(updated)
    }

    /// Remove a habit and its completions; returns the completions removed
    fn delete_habit(&mut self, id: HabitId) -> Result<usize> {
        self.habit(id)?;

        let before = self.completions.len();
        self.completions.retain(|c| c.habit_id != id);
        let removed = before - self.completions.len();

        self.habits.retain(|h| h.id != id);
        self.dirty = true;
        Ok(removed)
    }

    fn add_completion(&mut self, habit_id: HabitId, date: NaiveDate) -> Result<MarkOutcome> {
        let habit = self.habit(habit_id)?;
        if date < habit.start_date {
            return Err(Error::Validation(format!(
                "Cannot complete habit {} on {}: it starts on {}",
                habit_id, date, habit.start_date
            )));
        }

        let exists = self
            .completions
            .iter()
            .any(|c| c.habit_id == habit_id && c.date_completed == date);
        if exists {
            return Ok(MarkOutcome::AlreadyCompleted);
        }

        let completion = Completion {
            id: CompletionId(self.next_completion_id),
            habit_id,
            date_completed: date,
            created_at: Utc::now(),
        };
        self.next_completion_id += 1;
        self.completions.push(completion.clone());
        self.dirty = true;
        Ok(MarkOutcome::Completed(completion))
    }

    fn remove_completion(&mut self, habit_id: HabitId, date: NaiveDate) -> Result<UnmarkOutcome> {
        self.habit(habit_id)?;

        let position = self
            .completions
            .iter()
            .position(|c| c.habit_id == habit_id && c.date_completed == date);

        match position {
            Some(index) => {
                let removed = self.completions.remove(index);
                self.dirty = true;
                Ok(UnmarkOutcome::Removed(removed))
            }
            None => Ok(UnmarkOutcome::NotFound),
        }
    }
}

fn not_found(id: HabitId) -> Error {
    Error::NotFound(format!("Habit {}", id))
}

// ============================================================================
// Store
// ============================================================================

/// File-backed habit store rooted at a data directory
#[derive(Clone, Debug)]
pub struct HabitStore {
    data_dir: PathBuf,
}

impl HabitStore {
    /// Open the store in `data_dir`, creating the directory if needed
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        tracing::debug!("Opened habit store at {:?}", data_dir);
        Ok(Self { data_dir })
    }

    /// Path of the JSON snapshot holding both tables
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE)
    }

    fn open_lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        Ok(file)
    }

    /// Load both tables under a shared lock
    pub fn snapshot(&self) -> Result<Tables> {
        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let result = self.load_tables();
        lock.unlock()?;
        result
    }

    /// Run `f` against the tables under an exclusive lock, saving if it changed them
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>,
    {
        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let result = self.load_tables().and_then(|mut tables| {
            let value = f(&mut tables)?;
            if tables.dirty {
                self.save_tables(&tables)?;
            }
            Ok(value)
        });

        lock.unlock()?;
        result
    }

    fn load_tables(&self) -> Result<Tables> {
        let path = self.snapshot_path();
        if !path.exists() {
            tracing::debug!("No snapshot at {:?}, starting empty", path);
            return Ok(Tables::default());
        }

        let mut contents = String::new();
        File::open(&path)?.read_to_string(&mut contents)?;

        let tables: Tables = serde_json::from_str(&contents)?;
        tables.check_integrity()?;

        tracing::debug!(
            "Loaded {} habits and {} completions from {:?}",
            tables.habits.len(),
            tables.completions.len(),
            path
        );
        Ok(tables)
    }

    fn save_tables(&self, tables: &Tables) -> Result<()> {
        let path = self.snapshot_path();
        let temp = NamedTempFile::new_in(&self.data_dir)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(tables)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved snapshot to {:?}", path);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Habits
    // ------------------------------------------------------------------------

    pub fn create_habit(&self, draft: &HabitDraft) -> Result<Habit> {
        let habit = self.transaction(|tables| Ok(tables.insert_habit(draft)))?;
        tracing::info!("Created habit {} ({})", habit.id, habit.name);
        Ok(habit)
    }

    /// Create a habit from raw text input, validating name and frequency
    pub fn create_habit_from_input(
        &self,
        name: &str,
        frequency: &str,
        start_date: NaiveDate,
    ) -> Result<Habit> {
        let draft = HabitDraft::parse(name, frequency, start_date)?;
        self.create_habit(&draft)
    }

    pub fn get_habit(&self, id: HabitId) -> Result<Habit> {
        self.snapshot()?.habit(id).cloned()
    }

    /// All habits in creation order
    pub fn list_habits(&self) -> Result<Vec<Habit>> {
        Ok(self.snapshot()?.habits)
    }

    pub fn update_habit(&self, id: HabitId, draft: &HabitDraft) -> Result<Habit> {
        let habit = self.transaction(|tables| tables.update_habit(id, draft))?;
        tracing::info!("Updated habit {}", id);
        Ok(habit)
    }

    /// Delete a habit together with all of its completions
    ///
    /// Returns the number of completions removed.
    pub fn delete_habit(&self, id: HabitId) -> Result<usize> {
        let removed = self.transaction(|tables| tables.delete_habit(id))?;
        tracing::info!("Deleted habit {} and {} completions", id, removed);
        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------------

    /// Mark a habit done on `date`; a second mark for the same day is a no-op
    ///
    /// Dates before the habit's start date fail with `Error::Validation`.
    pub fn add_completion(&self, habit_id: HabitId, date: NaiveDate) -> Result<MarkOutcome> {
        let outcome = self.transaction(|tables| tables.add_completion(habit_id, date))?;
        match &outcome {
            MarkOutcome::Completed(c) => {
                tracing::info!("Habit {} completed on {} (completion {})", habit_id, date, c.id)
            }
            MarkOutcome::AlreadyCompleted => {
                tracing::debug!("Habit {} already completed on {}", habit_id, date)
            }
        }
        Ok(outcome)
    }

    /// Remove the completion of a habit on `date`, if there is one
    pub fn remove_completion(&self, habit_id: HabitId, date: NaiveDate) -> Result<UnmarkOutcome> {
        let outcome = self.transaction(|tables| tables.remove_completion(habit_id, date))?;
        match &outcome {
            UnmarkOutcome::Removed(_) => {
                tracing::info!("Removed completion of habit {} on {}", habit_id, date)
            }
            UnmarkOutcome::NotFound => {
                tracing::debug!("No completion of habit {} on {}", habit_id, date)
            }
        }
        Ok(outcome)
    }

    /// Completions of a habit, ascending by date
    pub fn list_completions(&self, habit_id: HabitId) -> Result<Vec<Completion>> {
        let tables = self.snapshot()?;
        tables.habit(habit_id)?;
        Ok(tables.completions_for(habit_id).into_iter().cloned().collect())
    }

    /// Completion dates of a habit, ascending
    pub fn completion_dates(&self, habit_id: HabitId) -> Result<Vec<NaiveDate>> {
        let tables = self.snapshot()?;
        tables.habit(habit_id)?;
        Ok(tables.dates_for(habit_id))
    }

    // ------------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------------

    pub fn habit_stats(&self, habit_id: HabitId, today: NaiveDate) -> Result<HabitStats> {
        let tables = self.snapshot()?;
        let habit = tables.habit(habit_id)?;
        Ok(HabitStats::compute(habit, &tables.dates_for(habit_id), today))
    }

    pub fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let tables = self.snapshot()?;
        let dates: Vec<Vec<NaiveDate>> = tables
            .habits
            .iter()
            .map(|h| tables.dates_for(h.id))
            .collect();

        let entries = tables
            .habits
            .iter()
            .zip(dates.iter())
            .map(|(habit, dates)| (habit, dates.as_slice()));

        Ok(Dashboard::compute(entries, today))
    }
}
