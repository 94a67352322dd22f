//! Registry of in-flight uploads and downloads.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

const ID_LEN: usize = 8;

/// Short random identifier for a transfer: 8 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TransferId(String);

impl TransferId {
    fn random() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ID_LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransferId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Upload,
    Download,
}

/// Public description of a tracked transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferInfo {
    pub id: TransferId,
    pub kind: TransferKind,
    pub bucket: String,
    pub object: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Entry {
    info: TransferInfo,
    task: Option<AbortHandle>,
    payload: Option<Arc<[u8]>>,
}

/// Tracks in-flight transfers so they can be listed, retried or cancelled.
#[derive(Debug, Default)]
pub struct TransferRegistry {
    entries: Mutex<HashMap<TransferId, Entry>>,
}

impl TransferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<TransferId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking a transfer and return its id.
    pub fn register(
        &self,
        kind: TransferKind,
        bucket: impl Into<String>,
        object: impl Into<String>,
    ) -> TransferId {
        let mut entries = self.entries();
        let id = loop {
            let candidate = TransferId::random();
            if !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        let info = TransferInfo {
            id: id.clone(),
            kind,
            bucket: bucket.into(),
            object: object.into(),
            started_at: Utc::now(),
        };
        debug!(id = %id, ?kind, bucket = %info.bucket, object = %info.object, "transfer registered");
        entries.insert(
            id.clone(),
            Entry {
                info,
                task: None,
                payload: None,
            },
        );
        id
    }

    /// Register a transfer and run `work` on the tokio runtime. The entry is
    /// removed when the work finishes.
    pub fn spawn<F>(
        self: &Arc<Self>,
        kind: TransferKind,
        bucket: impl Into<String>,
        object: impl Into<String>,
        work: F,
    ) -> TransferId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.register(kind, bucket, object);
        let registry = Arc::clone(self);
        let task_id = id.clone();
        // Lock held across spawn: the task must not remove its entry before
        // the abort handle is attached.
        let mut entries = self.entries();
        let handle = tokio::spawn(async move {
            work.await;
            registry.remove(&task_id);
        });
        if let Some(entry) = entries.get_mut(&id) {
            entry.task = Some(handle.abort_handle());
        }
        id
    }

    /// Remember the task carrying a transfer so it can be cancelled.
    pub fn attach_task(&self, id: &TransferId, task: AbortHandle) -> Result<()> {
        let mut entries = self.entries();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| Error::TransferNotFound(id.to_string()))?;
        entry.task = Some(task);
        Ok(())
    }

    /// Keep an upload's body so the transfer can be retried.
    pub fn attach_payload(&self, id: &TransferId, payload: impl Into<Arc<[u8]>>) -> Result<()> {
        let mut entries = self.entries();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| Error::TransferNotFound(id.to_string()))?;
        entry.payload = Some(payload.into());
        Ok(())
    }

    pub fn get(&self, id: &TransferId) -> Option<TransferInfo> {
        self.entries().get(id).map(|e| e.info.clone())
    }

    pub fn payload(&self, id: &TransferId) -> Option<Arc<[u8]>> {
        self.entries().get(id).and_then(|e| e.payload.clone())
    }

    /// All tracked transfers, oldest first.
    pub fn list(&self) -> Vec<TransferInfo> {
        let mut infos: Vec<_> = self.entries().values().map(|e| e.info.clone()).collect();
        infos.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.0.cmp(&b.id.0)));
        infos
    }

    /// Abort the transfer's task, if any, and forget it.
    pub fn cancel(&self, id: &TransferId) -> bool {
        let Some(entry) = self.entries().remove(id) else {
            return false;
        };
        if let Some(task) = entry.task {
            task.abort();
        }
        debug!(id = %id, "transfer cancelled");
        true
    }

    /// Forget a transfer without touching its task.
    pub fn remove(&self, id: &TransferId) -> bool {
        let removed = self.entries().remove(id).is_some();
        if removed {
            debug!(id = %id, "transfer removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
