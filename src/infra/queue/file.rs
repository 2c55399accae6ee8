//! File-backed pending queue.
//!
//! Entries live in a JSON-lines file `<dir>/<stream>.jsonl`. Inserts append one line;
//! deletes rewrite the file from the in-memory index. The file is loaded on open, so
//! pending deliveries survive a restart.

use std::collections::BTreeMap;
use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::core::model::{PendingDelivery, PendingKey, UserId};
use crate::core::{NotifyError, PendingQueue};
use crate::infra::queue::memory::{check_insert, user_range};

/// File-backed queue using JSON lines for durability.
pub struct FilePendingQueue {
    file_path: PathBuf,
    max_depth: usize,
    entries: BTreeMap<PendingKey, PendingDelivery>,
}

fn backend(e: impl std::fmt::Display) -> NotifyError {
    NotifyError::Backend(e.to_string())
}

impl FilePendingQueue {
    /// Open (or create) the queue file for `stream` under `dir`.
    ///
    /// # Errors
    ///
    /// [`NotifyError::Backend`] when the directory or file cannot be read or a line
    /// does not parse.
    pub fn open(dir: impl AsRef<Path>, stream: &str, max_depth: usize) -> Result<Self, NotifyError> {
        let dir = dir.as_ref();
        create_dir_all(dir).map_err(backend)?;
        let mut queue = Self {
            file_path: dir.join(format!("{stream}.jsonl")),
            max_depth,
            entries: BTreeMap::new(),
        };
        queue.load_from_disk()?;
        tracing::debug!(
            "opened pending queue {} with {} entries",
            queue.file_path.display(),
            queue.entries.len()
        );
        Ok(queue)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load_from_disk(&mut self) -> Result<(), NotifyError> {
        if !self.file_path.exists() {
            return Ok(());
        }
        let file = OpenOptions::new()
            .read(true)
            .open(&self.file_path)
            .map_err(backend)?;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(backend)?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: PendingDelivery = serde_json::from_str(&line).map_err(backend)?;
            self.entries.insert(entry.key, entry);
        }
        Ok(())
    }

    fn append_to_disk(&self, entry: &PendingDelivery) -> Result<(), NotifyError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(backend)?;
        let line = serde_json::to_string(entry).map_err(backend)?;
        writeln!(file, "{line}").map_err(backend)
    }

    fn rewrite_disk(&self) -> Result<(), NotifyError> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.file_path)
            .map_err(backend)?;
        for entry in self.entries.values() {
            let line = serde_json::to_string(entry).map_err(backend)?;
            writeln!(file, "{line}").map_err(backend)?;
        }
        Ok(())
    }
}

impl PendingQueue for FilePendingQueue {
    fn insert(&mut self, entry: PendingDelivery) -> Result<(), NotifyError> {
        check_insert(&self.entries, self.max_depth, &entry)?;
        self.append_to_disk(&entry)?;
        self.entries.insert(entry.key, entry);
        Ok(())
    }

    fn find_by_user(&self, user_id: UserId) -> Result<Vec<PendingDelivery>, NotifyError> {
        Ok(self
            .entries
            .range(user_range(user_id))
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn delete(&mut self, key: &PendingKey) -> Result<bool, NotifyError> {
        let Some(removed) = self.entries.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.rewrite_disk() {
            self.entries.insert(removed.key, removed);
            return Err(e);
        }
        Ok(true)
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("notify-queue-{}", uuid::Uuid::new_v4()))
    }

    fn entry(user_id: UserId, event_id: i64) -> PendingDelivery {
        let at = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(21, 15, 0)
            .unwrap();
        PendingDelivery::new(user_id, event_id, at)
    }

    #[test]
    fn test_survives_reopen() {
        let dir = scratch_dir();
        {
            let mut q = FilePendingQueue::open(&dir, "pending", 100).unwrap();
            q.insert(entry(1, 1)).unwrap();
            q.insert(entry(1, 2)).unwrap();
            q.insert(entry(2, 1)).unwrap();
            assert!(q
                .delete(&PendingKey {
                    user_id: 1,
                    event_id: 1
                })
                .unwrap());
        }

        let q = FilePendingQueue::open(&dir, "pending", 100).unwrap();
        assert_eq!(q.len(), 2);
        let user1 = q.find_by_user(1).unwrap();
        assert_eq!(user1, vec![entry(1, 2)]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_duplicate_not_written() {
        let dir = scratch_dir();
        let mut q = FilePendingQueue::open(&dir, "pending", 100).unwrap();
        q.insert(entry(5, 9)).unwrap();
        assert!(q.insert(entry(5, 9)).is_err());

        let contents = std::fs::read_to_string(q.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_line_fails_open() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("pending.jsonl"), "not json\n").unwrap();
        assert!(matches!(
            FilePendingQueue::open(&dir, "pending", 10),
            Err(NotifyError::Backend(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
