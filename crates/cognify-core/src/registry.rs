//! The session's content identifiers
//!
//! Ingestion produces one identifier per processed video or document. The
//! registry keeps them in arrival order for the lifetime of the session and
//! tells subscribers whenever the list grows.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::{info, warn};

/// Opaque token the backend hands out for one ingested unit of content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append-only, ordered list of content identifiers
pub struct ContentRegistry {
    ids: Vec<ContentId>,
    revision: u64,
    // carries the revision after each change
    tx: watch::Sender<u64>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            ids: Vec::new(),
            revision: 0,
            tx,
        }
    }

    /// Append an identifier. Returns false if it was already registered.
    pub fn register(&mut self, id: ContentId) -> bool {
        if self.ids.contains(&id) {
            warn!(content_id = %id, "Ignoring duplicate content identifier");
            return false;
        }

        self.ids.push(id);
        self.revision += 1;
        info!(count = self.ids.len(), revision = self.revision, "Content registered");

        // Nobody listening is fine, the value is still stored
        self.tx.send_replace(self.revision);
        true
    }

    /// Receiver of the revision; marked changed on every registration
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    pub fn ids(&self) -> &[ContentId] {
        &self.ids
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The read-only study views are usable iff something was ingested
    pub fn has_content(&self) -> bool {
        !self.is_empty()
    }
}

impl Default for ContentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
