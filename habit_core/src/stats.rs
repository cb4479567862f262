//! Derived statistics over a habit's completion dates.
//!
//! Every function here is pure: the reference day is passed in as `today`
//! and nothing is read from the clock or the store. Inputs are calendar
//! dates in any order; the store guarantees at most one completion per day,
//! so no function here deduplicates.
//!
//! Weekly habits use the same day-by-day streak math as daily ones.

use crate::Habit;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

/// True iff `today` is one of the completion dates
pub fn is_completed_today(dates: &[NaiveDate], today: NaiveDate) -> bool {
    dates.contains(&today)
}

/// Number of consecutive completed days ending at `today`
///
/// The streak counts as broken (0) when the latest completion is older than
/// yesterday. Otherwise days are counted walking backward from `today`, so a
/// habit completed through yesterday but not yet today reports 0 even though
/// it passes the broken check. Downstream display depends on this exact
/// value; keep it.
pub fn current_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(latest) = dates.iter().max() else {
        return 0;
    };

    let yesterday = today.pred_opt().unwrap_or(today);
    if *latest < yesterday {
        return 0;
    }

    let completed: HashSet<NaiveDate> = dates.iter().copied().collect();
    let mut streak = 0;
    let mut day = Some(today);

    while let Some(d) = day.filter(|d| completed.contains(d)) {
        streak += 1;
        day = d.pred_opt();
    }

    streak
}

/// Length of the longest run of consecutive completed days
pub fn longest_streak(dates: &[NaiveDate]) -> u32 {
    if dates.is_empty() {
        return 0;
    }

    let mut sorted = dates.to_vec();
    sorted.sort_unstable();

    let mut longest = 1;
    let mut run = 1;

    for pair in sorted.windows(2) {
        if pair[0].succ_opt() == Some(pair[1]) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }

    longest
}

/// Share of days since `start_date` (inclusive) with a completion, in percent
///
/// Rounded to one decimal place, ties to even. Returns 0.0 when there are no completions
/// or when `start_date` lies after `today`.
pub fn completion_percentage(dates: &[NaiveDate], start_date: NaiveDate, today: NaiveDate) -> f64 {
    if dates.is_empty() {
        return 0.0;
    }

    let days_elapsed = (today - start_date).num_days() + 1;
    if days_elapsed <= 0 {
        return 0.0;
    }

    let percentage = dates.len() as f64 / days_elapsed as f64 * 100.0;
    round_to_tenth(percentage)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// All derived values for one habit, as shown next to it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HabitStats {
    pub completed_today: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completion_percentage: f64,
    pub total_completions: usize,
}

impl HabitStats {
    pub fn compute(habit: &Habit, dates: &[NaiveDate], today: NaiveDate) -> Self {
        Self {
            completed_today: is_completed_today(dates, today),
            current_streak: current_streak(dates, today),
            longest_streak: longest_streak(dates),
            completion_percentage: completion_percentage(dates, habit.start_date, today),
            total_completions: dates.len(),
        }
    }
}

/// A habit paired with its statistics
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HabitSummary {
    pub habit: Habit,
    pub stats: HabitStats,
}

/// Overview of all habits for a given day
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub total_habits: usize,
    pub completed_today: usize,
    pub habits: Vec<HabitSummary>,
}

impl Dashboard {
    /// Summarize habits (in the order given) with their completion dates
    pub fn compute<'a, I>(entries: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = (&'a Habit, &'a [NaiveDate])>,
    {
        let habits: Vec<HabitSummary> = entries
            .into_iter()
            .map(|(habit, dates)| HabitSummary {
                habit: habit.clone(),
                stats: HabitStats::compute(habit, dates, today),
            })
            .collect();

        let completed_today = habits.iter().filter(|h| h.stats.completed_today).count();

        Self {
            today,
            total_habits: habits.len(),
            completed_today,
            habits,
        }
    }
}
