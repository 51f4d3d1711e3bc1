//! Snapshot persistence for the queue document.
//!
//! A dumb persisted value: atomic `get`/`set`, no validation. All validation
//! happens in the handlers before `set` is reached.

use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::queue::QueueState;

pub struct StateStore {
    path: Option<PathBuf>,
    doc: QueueState,
}

impl StateStore {
    /// Load the snapshot, or start from the empty default document.
    ///
    /// A corrupt snapshot is logged and replaced rather than refusing to
    /// start; unknown fields inside a readable one are ignored.
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        let doc = match &path {
            Some(path) if path.is_file() => {
                let raw = fs::read(path)?;
                match serde_json::from_slice(&raw) {
                    Ok(doc) => doc,
                    Err(err) => {
                        tracing::error!(
                            error = %err,
                            path = %path.display(),
                            "unreadable state snapshot, starting empty"
                        );
                        QueueState::default()
                    },
                }
            },
            _ => QueueState::default(),
        };

        Ok(Self { path, doc })
    }

    /// Current snapshot.
    pub fn get(&self) -> &QueueState {
        &self.doc
    }

    /// Replace the document, persisting it first when a path is configured.
    pub fn set(&mut self, doc: QueueState) -> Result<()> {
        if let Some(path) = &self.path {
            let raw = serde_json::to_vec(&doc)?;
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, raw)?;
            fs::rename(&tmp, path)?;
        }
        self.doc = doc;
        Ok(())
    }
}
