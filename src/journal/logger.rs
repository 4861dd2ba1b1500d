// Outcome journal

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::types::{AttemptRecord, DaySummary, TaskSummary};

/// Appends attempt records to one JSONL file per local day
pub struct OutcomeJournal {
    journal_dir: PathBuf,
}

impl OutcomeJournal {
    pub fn new(journal_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&journal_dir).with_context(|| {
            format!(
                "Failed to create journal directory: {}",
                journal_dir.display()
            )
        })?;

        Ok(Self { journal_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.journal_dir
    }

    fn day_file(&self, date: NaiveDate) -> PathBuf {
        self.journal_dir
            .join(format!("{}.jsonl", date.format("%Y-%m-%d")))
    }

    /// Append a record to the file for the record's own day
    pub fn log(&self, record: &AttemptRecord) -> Result<()> {
        let log_file = self.day_file(record.timestamp.date_naive());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open journal: {}", log_file.display()))?;

        let json = serde_json::to_string(record).context("Failed to serialize attempt record")?;

        writeln!(file, "{}", json).context("Failed to write attempt record")?;

        Ok(())
    }

    /// Every record logged on `date`; a missing file means no attempts
    pub fn read_day(&self, date: NaiveDate) -> Result<Vec<AttemptRecord>> {
        let log_file = self.day_file(date);

        if !log_file.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&log_file)
            .with_context(|| format!("Failed to read journal: {}", log_file.display()))?;

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line).with_context(|| {
                    format!("Malformed journal line {} in {}", i + 1, log_file.display())
                })
            })
            .collect()
    }

    pub fn summary(&self, date: NaiveDate) -> Result<DaySummary> {
        Ok(summarize(&self.read_day(date)?))
    }
}

/// Fold attempts into totals plus a best outcome per task (in label order)
pub fn summarize(records: &[AttemptRecord]) -> DaySummary {
    let mut tasks: BTreeMap<&str, TaskSummary> = BTreeMap::new();

    for record in records {
        let entry = tasks
            .entry(record.task.as_str())
            .or_insert_with(|| TaskSummary {
                task: record.task.clone(),
                attempts: 0,
                succeeded: false,
                furthest_step: None,
                last_error: None,
            });

        entry.attempts += 1;
        if record.success {
            entry.succeeded = true;
        } else {
            entry.last_error = record.error.or(entry.last_error);
            if record.step_reached > entry.furthest_step {
                entry.furthest_step = record.step_reached;
            }
        }
    }

    DaySummary {
        attempts: records.len(),
        successes: records.iter().filter(|r| r.success).count(),
        tasks: tasks.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::matrix::Task;
    use crate::workflow::{StepId, WorkflowResult};
    use tempfile::TempDir;

    fn task(label: &str, column: usize) -> Task {
        Task::new(column, [10, 11], label).unwrap()
    }

    #[test]
    fn test_log_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let journal = OutcomeJournal::new(temp_dir.path().join("journal")).unwrap();

        let failed = WorkflowResult::failed(StepId::ClaimSlots, ErrorKind::SlotUnavailable, None);
        let record = AttemptRecord::from_result(&task("3-1", 5), 1, &failed);
        journal.log(&record).unwrap();
        journal
            .log(&AttemptRecord::from_result(&task("3-1", 5), 2, &WorkflowResult::completed(Some(7))))
            .unwrap();

        let records = journal.read_day(record.timestamp.date_naive()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rows, vec![10, 11]);
        assert_eq!(records[0].error, Some(ErrorKind::SlotUnavailable));
        assert_eq!(records[1].claimed_column, Some(7));
    }

    #[test]
    fn test_missing_day_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let journal = OutcomeJournal::new(temp_dir.path().to_path_buf()).unwrap();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        assert!(journal.read_day(date).unwrap().is_empty());
        assert_eq!(journal.summary(date).unwrap(), DaySummary::default());
    }

    #[test]
    fn test_summary_keeps_best_outcome_per_task() {
        let a = task("1-1", 1);
        let b = task("2-2", 4);
        let records = vec![
            AttemptRecord::from_result(
                &a,
                1,
                &WorkflowResult::failed(StepId::Authenticate, ErrorKind::AuthenticationFailed, None),
            ),
            AttemptRecord::from_result(&a, 2, &WorkflowResult::completed(Some(1))),
            AttemptRecord::from_result(
                &b,
                1,
                &WorkflowResult::failed(StepId::ClaimSlots, ErrorKind::PartialClaim, Some(3)),
            ),
            AttemptRecord::aborted(&b, 2, "session could not be opened"),
        ];

        let summary = summarize(&records);
        assert_eq!(summary.attempts, 4);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.tasks.len(), 2);

        assert!(summary.tasks[0].succeeded);
        assert_eq!(summary.tasks[0].task, "1-1");

        let b = &summary.tasks[1];
        assert!(!b.succeeded);
        assert_eq!(b.attempts, 2);
        assert_eq!(b.furthest_step, Some(StepId::ClaimSlots));
        assert_eq!(b.last_error, Some(ErrorKind::PartialClaim));
    }

    #[test]
    fn test_malformed_line_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let journal = OutcomeJournal::new(temp_dir.path().to_path_buf()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        fs::write(temp_dir.path().join("2024-05-06.jsonl"), "{not json}\n").unwrap();

        let err = journal.read_day(date).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
