use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{SubmitReceipt, Transport};
use crate::answers::AnswerSet;
use crate::errors::SubmissionError;

/// A submission written to the outbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: String,
    pub flow: String,
    pub submitted_at: DateTime<Utc>,
    pub payload: AnswerSet,
}

/// Writes each submission as `<flow>-<id>.json` into a directory.
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    dir: PathBuf,
    flow: String,
}

impl OutboxTransport {
    pub fn new(dir: impl AsRef<Path>, flow: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            flow: flow.to_string(),
        }
    }
}

#[async_trait]
impl Transport for OutboxTransport {
    async fn submit(&self, payload: &AnswerSet) -> Result<SubmitReceipt, SubmissionError> {
        let entry = OutboxEntry {
            id: uuid::Uuid::new_v4().to_string(),
            flow: self.flow.clone(),
            submitted_at: Utc::now(),
            payload: payload.clone(),
        };

        let content = serde_json::to_vec_pretty(&entry)
            .map_err(|e| SubmissionError::new(format!("Failed to encode submission: {}", e)))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            SubmissionError::new(format!(
                "Failed to create outbox {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.dir.join(format!("{}-{}.json", self.flow, entry.id));
        tokio::fs::write(&path, content).await.map_err(|e| {
            SubmissionError::new(format!("Failed to write {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), "submission written to outbox");
        Ok(SubmitReceipt::with_reference(entry.id))
    }
}
