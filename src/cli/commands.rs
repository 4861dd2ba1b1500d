// Command handlers

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

use super::Commands;
use crate::config::Config;
use crate::daemon::RunLock;
use crate::driver::WebDriverFactory;
use crate::journal::{DaySummary, OutcomeJournal};
use crate::matrix::{load_tasks, write_template, Task};
use crate::scheduling::{
    format_remaining, BookingScheduler, ScheduleConfig, SessionRunner, SystemClock,
};
use crate::workflow::ReservationWorkflow;

type LiveScheduler = BookingScheduler<SessionRunner<WebDriverFactory>, SystemClock>;

pub async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run { matrix } => run(config, matrix.as_deref()).await,
        Commands::Once { matrix } => once(config, matrix.as_deref()).await,
        Commands::Tasks { matrix } => tasks(config, matrix.as_deref()),
        Commands::Next { count } => next(config, count),
        Commands::Template { output, force } => template(config, output.as_deref(), force),
        Commands::Report { date } => {
            report(config, date.unwrap_or_else(|| Local::now().date_naive()))
        }
    }
}

/// Compile the matrix; every row-mapping or format problem is fatal here
pub fn compile_tasks(config: &Config, matrix: Option<&Path>) -> Result<Vec<Task>> {
    let path = matrix.unwrap_or(config.paths.matrix.as_path());
    let tasks = load_tasks(path, &config.grid.rows)
        .with_context(|| format!("Cannot compile reservation matrix {}", path.display()))?;
    info!("Compiled {} task(s) from {}", tasks.len(), path.display());
    Ok(tasks)
}

fn build_scheduler(config: &Config, schedule: ScheduleConfig) -> Result<LiveScheduler> {
    let factory = WebDriverFactory::new(config.webdriver.endpoint.clone(), config.webdriver.headless)?;
    let workflow = ReservationWorkflow::new(config.workflow_settings()?);
    let journal = OutcomeJournal::new(config.journal_dir()?)?;

    Ok(
        BookingScheduler::new(SessionRunner::new(factory, workflow), SystemClock, schedule)
            .with_policy(config.firing_policy())
            .with_journal(journal),
    )
}

async fn run(config: &Config, matrix: Option<&Path>) -> Result<()> {
    config.validate_for_booking()?;
    let schedule = config.schedule_config()?;
    let tasks = compile_tasks(config, matrix)?;
    if tasks.is_empty() {
        bail!("The reservation matrix flags no slot; nothing to book");
    }

    let lock = RunLock::acquire(config.pid_file()?)?;
    let scheduler = build_scheduler(config, schedule)?;

    tokio::select! {
        result = scheduler.run(&tasks) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted; stopping scheduler");
        }
    }

    lock.release()
}

async fn once(config: &Config, matrix: Option<&Path>) -> Result<()> {
    config.validate_for_booking()?;
    let tasks = compile_tasks(config, matrix)?;
    if tasks.is_empty() {
        println!("The reservation matrix flags no slot; nothing to book.");
        return Ok(());
    }

    let lock = RunLock::acquire(config.pid_file()?)?;
    let scheduler = build_scheduler(config, config.schedule_config()?)?;

    let tally = tokio::select! {
        tally = scheduler.fire(&tasks) => tally,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            lock.release()?;
            return Ok(());
        }
    };

    println!("Booked {}/{} task(s)", tally.succeeded, tally.total());
    lock.release()
}

fn tasks(config: &Config, matrix: Option<&Path>) -> Result<()> {
    let tasks = compile_tasks(config, matrix)?;
    if tasks.is_empty() {
        println!("No slot is flagged.");
        return Ok(());
    }

    for task in &tasks {
        println!("{}", task);
    }
    println!("\n{} task(s)", tasks.len());
    Ok(())
}

fn next(config: &Config, count: usize) -> Result<()> {
    let schedule = config.schedule_config()?;
    let now = Local::now().naive_local();

    println!("Triggers: {}", schedule);
    for at in schedule.upcoming(now, count.max(1)) {
        let remaining = (at - now).to_std().unwrap_or_default();
        println!("  {}  (in {})", at.format("%Y-%m-%d %H:%M"), format_remaining(remaining));
    }
    Ok(())
}

fn template(config: &Config, output: Option<&Path>, force: bool) -> Result<()> {
    let path: PathBuf = output.unwrap_or(config.paths.matrix.as_path()).to_path_buf();
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    write_template(&path)?;
    println!("Wrote blank matrix to {}", path.display());
    Ok(())
}

fn report(config: &Config, date: chrono::NaiveDate) -> Result<()> {
    let journal = OutcomeJournal::new(config.journal_dir()?)?;
    let summary = journal.summary(date)?;
    print!("{}", render_report(date, &summary));
    Ok(())
}

pub fn render_report(date: chrono::NaiveDate, summary: &DaySummary) -> String {
    if summary.attempts == 0 {
        return format!("No attempts recorded on {}\n", date);
    }

    let mut out = format!(
        "{}: {} attempt(s), {} successful\n",
        date, summary.attempts, summary.successes
    );
    for task in &summary.tasks {
        let outcome = if task.succeeded {
            "booked".to_string()
        } else {
            match (task.furthest_step, task.last_error) {
                (Some(step), Some(error)) => format!("failed at {} ({})", step, error),
                (Some(step), None) => format!("failed at {}", step),
                _ => "aborted".to_string(),
            }
        };
        out.push_str(&format!(
            "  {:<10} {:>2} attempt(s)  {}\n",
            task.task, task.attempts, outcome
        ));
    }
    out
}
