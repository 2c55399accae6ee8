//! File-backed push outbox.
//!
//! Every push is appended to `<dir>/<stream>_outbox.jsonl` as a
//! `[destination, message]` pair, for consumers that tail the file.

use std::collections::HashMap;
use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{Destination, NotifyError, PushChannel, PushMessage};
use crate::infra::push::{select, OutboxMessage};
use crate::util::clock::now_ms;

/// File-backed outbox using JSON lines for durability.
pub struct FilePushChannel {
    file_path: PathBuf,
    messages: Mutex<HashMap<Destination, Vec<OutboxMessage>>>,
}

impl FilePushChannel {
    /// Open (or create) the outbox file for `stream` under `dir`.
    ///
    /// # Errors
    ///
    /// [`NotifyError::Backend`] when the directory or file cannot be read or a line
    /// does not parse.
    pub fn open(dir: impl AsRef<Path>, stream: &str) -> Result<Self, NotifyError> {
        let backend = |e: &dyn std::fmt::Display| NotifyError::Backend(e.to_string());
        let dir = dir.as_ref();
        create_dir_all(dir).map_err(|e| backend(&e))?;
        let file_path = dir.join(format!("{stream}_outbox.jsonl"));

        let mut messages: HashMap<Destination, Vec<OutboxMessage>> = HashMap::new();
        if file_path.exists() {
            let file = OpenOptions::new()
                .read(true)
                .open(&file_path)
                .map_err(|e| backend(&e))?;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|e| backend(&e))?;
                if line.trim().is_empty() {
                    continue;
                }
                let (destination, msg): (Destination, OutboxMessage) =
                    serde_json::from_str(&line).map_err(|e| backend(&e))?;
                messages.entry(destination).or_default().push(msg);
            }
        }

        Ok(Self {
            file_path,
            messages: Mutex::new(messages),
        })
    }

    /// Path of the outbox file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Fetch messages pushed to a destination, optionally since a timestamp.
    #[must_use]
    pub fn fetch(
        &self,
        destination: &Destination,
        since_ms: Option<u128>,
        limit: usize,
    ) -> Vec<OutboxMessage> {
        select(self.messages.lock().get(destination), since_ms, limit)
    }

    fn append_to_disk(&self, destination: &Destination, msg: &OutboxMessage) -> Result<(), NotifyError> {
        let transport = |e: &dyn std::fmt::Display| NotifyError::Transport(e.to_string());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(|e| transport(&e))?;
        let line = serde_json::to_string(&(destination, msg)).map_err(|e| transport(&e))?;
        writeln!(file, "{line}").map_err(|e| transport(&e))
    }
}

#[async_trait]
impl PushChannel for FilePushChannel {
    async fn send(&self, destination: &Destination, message: PushMessage) -> Result<(), NotifyError> {
        let msg = OutboxMessage {
            message,
            sent_at_ms: now_ms(),
        };
        let mut messages = self.messages.lock();
        self.append_to_disk(destination, &msg)?;
        messages.entry(*destination).or_default().push(msg);
        Ok(())
    }
}
