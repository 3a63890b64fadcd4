//! The append-only conversation log.
//!
//! The log is one JSON array on disk, read fully and rewritten fully per
//! append. In-process writers are serialized behind a mutex so sequential
//! requests never lose entries; there is no cross-process locking.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::message::Message;

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("transcript io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("transcript serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub messages: Vec<Message>,
    pub response: String,
}

pub struct TranscriptLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TranscriptLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one conversation to the log file.
    pub async fn append(
        &self,
        messages: &[Message],
        response: &str,
    ) -> Result<(), TranscriptError> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // A missing or undecodable file starts a fresh log.
        let mut entries = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str::<Vec<TranscriptEntry>>(&contents)
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        entries.push(TranscriptEntry {
            messages: messages.to_vec(),
            response: response.to_string(),
        });

        let serialized = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }

    /// Load all logged conversations.
    pub async fn read_all(&self) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequential_appends_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = TranscriptLog::new(dir.path().join("conversation_history.json"));

        for i in 0..3 {
            let messages = vec![Message::user(format!("question {i}"))];
            log.append(&messages, &format!("answer {i}")).await.unwrap();
        }

        let entries = log.read_all().await.unwrap();
        assert_eq!(entries.len(), 3);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.response, format!("answer {i}"));
            assert_eq!(entry.messages[0].content, format!("question {i}"));
        }
    }

    #[tokio::test]
    async fn test_corrupt_log_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation_history.json");
        tokio::fs::write(&path, "{definitely not an array")
            .await
            .unwrap();

        let log = TranscriptLog::new(&path);
        log.append(&[Message::user("hi")], "hello").await.unwrap();

        let entries = log.read_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response, "hello");
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = TranscriptLog::new(dir.path().join("absent.json"));
        assert!(log.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log = TranscriptLog::new(dir.path().join("kb").join("history.json"));
        log.append(&[Message::user("hi")], "hello").await.unwrap();
        assert_eq!(log.read_all().await.unwrap().len(), 1);
    }
}
