use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use habit_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "habits")]
#[command(about = "Personal habit tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// List habits with today's progress (default)
    List,

    /// Create a new habit
    Add {
        /// Habit name (1-100 characters)
        name: String,

        /// Repetition unit (daily, weekly)
        #[arg(long, short, default_value = "daily")]
        frequency: String,

        /// First day of the habit (defaults to today)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
    },

    /// Show a habit with its statistics and completion dates
    Show { id: HabitId },

    /// Change a habit's name, frequency or start date
    Edit {
        id: HabitId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, short)]
        frequency: Option<String>,

        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
    },

    /// Delete a habit and all of its completions
    Delete { id: HabitId },

    /// Mark a habit as completed (today unless --date is given)
    Done {
        id: HabitId,

        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Remove the completion of a habit for a date (YYYY-MM-DD)
    Undo { id: HabitId, date: String },

    /// Dump the habit and completion tables as CSV
    Dump {
        /// Output directory (defaults to <data-dir>/tables)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    habit_core::logging::init_with_level(&config.logging.level);

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let store = HabitStore::open(&data_dir)?;
    tracing::debug!("Using data directory {:?}, today is {}", data_dir, today);

    match cli.command {
        Some(Commands::List) | None => cmd_list(&store, today),
        Some(Commands::Add {
            name,
            frequency,
            start,
        }) => cmd_add(&store, &name, &frequency, start.unwrap_or(today)),
        Some(Commands::Show { id }) => cmd_show(&store, id, today),
        Some(Commands::Edit {
            id,
            name,
            frequency,
            start,
        }) => cmd_edit(&store, id, name, frequency, start),
        Some(Commands::Delete { id }) => cmd_delete(&store, id),
        Some(Commands::Done { id, date }) => cmd_done(&store, id, date.unwrap_or(today), today),
        Some(Commands::Undo { id, date }) => cmd_undo(&store, id, &date),
        Some(Commands::Dump { out }) => {
            let out = out.unwrap_or_else(|| data_dir.join("tables"));
            cmd_dump(&store, out)
        }
    }
}

fn cmd_list(store: &HabitStore, today: NaiveDate) -> Result<()> {
    let dashboard = store.dashboard(today)?;

    if dashboard.habits.is_empty() {
        println!("No habits yet. Add one with `habits add <NAME>`.");
        return Ok(());
    }

    println!(
        "Habits: {} | Completed today: {}/{}",
        dashboard.total_habits, dashboard.completed_today, dashboard.total_habits
    );
    println!();

    for summary in &dashboard.habits {
        let mark = if summary.stats.completed_today { "x" } else { " " };
        println!(
            "  [{}] #{} {} ({})  streak {}  best {}  {:.1}%",
            mark,
            summary.habit.id,
            summary.habit.name,
            summary.habit.frequency,
            summary.stats.current_streak,
            summary.stats.longest_streak,
            summary.stats.completion_percentage,
        );
    }

    Ok(())
}

fn cmd_add(store: &HabitStore, name: &str, frequency: &str, start: NaiveDate) -> Result<()> {
    let habit = store.create_habit_from_input(name, frequency, start)?;
    println!("Habit created successfully!");
    println!("  #{} {} ({}, from {})", habit.id, habit.name, habit.frequency, habit.start_date);
    Ok(())
}

fn cmd_show(store: &HabitStore, id: HabitId, today: NaiveDate) -> Result<()> {
    let habit = store.get_habit(id)?;
    let dates = store.completion_dates(id)?;
    let stats = HabitStats::compute(&habit, &dates, today);

    println!("#{} {} ({})", habit.id, habit.name, habit.frequency);
    println!("  Started:         {}", habit.start_date);
    println!(
        "  Done today:      {}",
        if stats.completed_today { "yes" } else { "no" }
    );
    println!("  Current streak:  {} days", stats.current_streak);
    println!("  Longest streak:  {} days", stats.longest_streak);
    println!("  Completion rate: {:.1}%", stats.completion_percentage);
    println!();

    if dates.is_empty() {
        println!("  No completions yet.");
    } else {
        println!("  Completions ({}):", dates.len());
        for date in dates.iter().rev() {
            println!("    {}", date);
        }
    }

    Ok(())
}

fn cmd_edit(
    store: &HabitStore,
    id: HabitId,
    name: Option<String>,
    frequency: Option<String>,
    start: Option<NaiveDate>,
) -> Result<()> {
    let current = store.get_habit(id)?;

    let frequency = match frequency {
        Some(text) => text.parse::<Frequency>()?,
        None => current.frequency,
    };
    let draft = HabitDraft::new(
        name.unwrap_or(current.name),
        frequency,
        start.unwrap_or(current.start_date),
    )?;

    let habit = store.update_habit(id, &draft)?;
    println!("Habit updated successfully!");
    println!("  #{} {} ({}, from {})", habit.id, habit.name, habit.frequency, habit.start_date);
    Ok(())
}

fn cmd_delete(store: &HabitStore, id: HabitId) -> Result<()> {
    store.delete_habit(id)?;
    println!("Habit deleted successfully!");
    Ok(())
}

fn cmd_done(store: &HabitStore, id: HabitId, date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > today {
        return Err(Error::Validation(format!(
            "Cannot complete a habit on {}: it is after today ({})",
            date, today
        )));
    }

    match store.add_completion(id, date)? {
        MarkOutcome::Completed(_) => println!("Habit marked as completed!"),
        MarkOutcome::AlreadyCompleted if date == today => {
            println!("Habit already completed today!")
        }
        MarkOutcome::AlreadyCompleted => println!("Habit already completed on {}!", date),
    }
    Ok(())
}

fn cmd_undo(store: &HabitStore, id: HabitId, date: &str) -> Result<()> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| Error::Validation("Invalid date format!".into()))?;

    match store.remove_completion(id, date)? {
        UnmarkOutcome::Removed(_) => println!("Completion removed!"),
        UnmarkOutcome::NotFound => println!("Completion not found!"),
    }
    Ok(())
}

fn cmd_dump(store: &HabitStore, out: PathBuf) -> Result<()> {
    let dump = dump_tables(store, &out)?;

    println!(
        "✓ Dumped {} habits and {} completions",
        dump.habit_rows, dump.completion_rows
    );
    println!("  {}", dump.habits_path.display());
    println!("  {}", dump.completions_path.display());
    Ok(())
}
