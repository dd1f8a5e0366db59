use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::EmissionRecord;

/// One line of the entry log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LogEvent {
    Created { entry: EmissionRecord },
    Updated { entry: EmissionRecord },
    Deleted { id: Uuid, at: DateTime<Utc> },
}

/// Append-only JSON-lines log of entry events.
/// Never edited in place; current entries are derived by replay.
#[derive(Debug, Clone)]
pub struct EntryLog {
    path: PathBuf,
}

impl EntryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The only write operation
    pub fn append(&self, event: &LogEvent) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(event).map_err(StoreError::Encode)?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// All events in write order. A missing log is an empty log.
    pub fn read_events(&self) -> Result<Vec<LogEvent>, StoreError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let reader = std::io::BufReader::new(file);

        let mut events = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&line).map_err(|source| StoreError::Corrupt {
                line: idx + 1,
                source,
            })?;
            events.push(event);
        }
        Ok(events)
    }

    /// Current entries, in creation order
    pub fn entries(&self) -> Result<Vec<EmissionRecord>, StoreError> {
        Ok(replay(self.read_events()?))
    }

    pub fn entries_for(&self, user_id: Uuid) -> Result<Vec<EmissionRecord>, StoreError> {
        let mut entries = self.entries()?;
        entries.retain(|e| e.user_id == user_id);
        Ok(entries)
    }

    pub fn find(&self, id: Uuid) -> Result<Option<EmissionRecord>, StoreError> {
        Ok(self.entries()?.into_iter().find(|e| e.id == id))
    }
}

/// Runs a blocking log operation on the blocking thread pool
pub async fn spawn_log_op<F, T>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Folds events into the current set of entries, in creation order
pub fn replay(events: impl IntoIterator<Item = LogEvent>) -> Vec<EmissionRecord> {
    // Deleted slots stay as None so positions never shift
    let mut slots: Vec<Option<EmissionRecord>> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for event in events {
        match event {
            LogEvent::Created { entry } => {
                index.insert(entry.id, slots.len());
                slots.push(Some(entry));
            }
            LogEvent::Updated { entry } => {
                if let Some(&pos) = index.get(&entry.id) {
                    slots[pos] = Some(entry);
                }
            }
            LogEvent::Deleted { id, .. } => {
                if let Some(pos) = index.remove(&id) {
                    slots[pos] = None;
                }
            }
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record(category: &str, co2: f64) -> EmissionRecord {
        EmissionRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category: category.to_string(),
            subcategory: "car".to_string(),
            quantity: 10.0,
            unit: "km".to_string(),
            co2_equivalent: co2,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = EntryLog::new(dir.path().join("nope.log"));
        assert!(log.read_events().unwrap().is_empty());
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let log = EntryLog::new(dir.path().join("data").join("emissions.log"));

        let entry = record("transport", 2.1);
        log.append(&LogEvent::Created { entry: entry.clone() }).unwrap();

        assert_eq!(log.entries().unwrap(), vec![entry]);
    }

    #[test]
    fn test_log_append_only() {
        let temp_file = NamedTempFile::new().unwrap();
        let log = EntryLog::new(temp_file.path());

        let first = record("transport", 2.1);
        let second = record("food", 27.0);
        log.append(&LogEvent::Created { entry: first.clone() }).unwrap();
        log.append(&LogEvent::Created { entry: second.clone() }).unwrap();
        log.append(&LogEvent::Deleted { id: first.id, at: Utc::now() }).unwrap();

        // Every event stays on disk, order preserved
        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"op\":\"created\""));
        assert!(lines[2].contains("\"op\":\"deleted\""));

        assert_eq!(log.entries().unwrap(), vec![second]);
    }

    #[test]
    fn test_replay_update_replaces_in_place() {
        let a = record("transport", 1.0);
        let b = record("energy", 2.0);
        let mut a2 = a.clone();
        a2.co2_equivalent = 5.0;

        let entries = replay(vec![
            LogEvent::Created { entry: a },
            LogEvent::Created { entry: b.clone() },
            LogEvent::Updated { entry: a2.clone() },
        ]);

        assert_eq!(entries, vec![a2, b]);
    }

    #[test]
    fn test_replay_ignores_update_of_unknown_entry() {
        let entries = replay(vec![LogEvent::Updated { entry: record("food", 1.0) }]);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_replay_deleted_entry_stays_deleted() {
        let a = record("transport", 1.0);
        let b = record("energy", 2.0);
        let c = record("food", 3.0);
        let mut b2 = b.clone();
        b2.co2_equivalent = 9.0;
        let mut a2 = a.clone();
        a2.co2_equivalent = 4.0;

        let entries = replay(vec![
            LogEvent::Created { entry: a.clone() },
            LogEvent::Created { entry: b.clone() },
            LogEvent::Deleted { id: b.id, at: Utc::now() },
            // Late update of a deleted entry must not bring it back
            LogEvent::Updated { entry: b2 },
            LogEvent::Created { entry: c.clone() },
            LogEvent::Updated { entry: a2.clone() },
            LogEvent::Deleted { id: Uuid::new_v4(), at: Utc::now() },
        ]);

        assert_eq!(entries, vec![a2, c]);
    }

    #[test]
    fn test_replay_large_log() {
        let records: Vec<EmissionRecord> = (0..20_000).map(|i| record("food", i as f64)).collect();

        let mut events: Vec<LogEvent> = records
            .iter()
            .map(|r| LogEvent::Created { entry: r.clone() })
            .collect();
        events.extend(records.iter().step_by(2).map(|r| LogEvent::Deleted {
            id: r.id,
            at: Utc::now(),
        }));

        let entries = replay(events);
        assert_eq!(entries.len(), 10_000);
        assert_eq!(entries[0], records[1]);
        assert_eq!(entries[9_999], records[19_999]);
    }

    #[tokio::test]
    async fn test_spawn_log_op_runs_off_the_runtime() {
        let temp_file = NamedTempFile::new().unwrap();
        let log = EntryLog::new(temp_file.path());
        let entry = record("energy", 3.0);

        let writer = log.clone();
        let event = LogEvent::Created { entry: entry.clone() };
        spawn_log_op(move || writer.append(&event)).await.unwrap();

        let reader = log.clone();
        let found = spawn_log_op(move || reader.find(entry.id)).await.unwrap();
        assert_eq!(found, Some(entry));
    }

    #[test]
    fn test_entries_for_user_and_find() {
        let temp_file = NamedTempFile::new().unwrap();
        let log = EntryLog::new(temp_file.path());

        let mine = record("transport", 1.0);
        let theirs = record("transport", 2.0);
        log.append(&LogEvent::Created { entry: mine.clone() }).unwrap();
        log.append(&LogEvent::Created { entry: theirs.clone() }).unwrap();

        assert_eq!(log.entries_for(mine.user_id).unwrap(), vec![mine.clone()]);
        assert_eq!(log.find(theirs.id).unwrap(), Some(theirs));
        assert_eq!(log.find(Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn test_blank_lines_skipped_and_corruption_reported() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let entry = record("food", 2.5);
        let line = serde_json::to_string(&LogEvent::Created { entry }).unwrap();
        writeln!(temp_file, "{}", line).unwrap();
        writeln!(temp_file, "").unwrap();
        writeln!(temp_file, "not json").unwrap();

        let log = EntryLog::new(temp_file.path());
        match log.read_events() {
            Err(StoreError::Corrupt { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected corruption error, got {:?}", other),
        }
    }
}
