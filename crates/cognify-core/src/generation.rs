//! Result sets produced by one backend call (flashcards, quiz questions)
//!
//! Each request is issued with a ticket. Only the newest ticket may land its
//! result, so a slow response for an older identifier list can't overwrite
//! a newer one.

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Handle for one in-flight generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub revision: u64,
}

#[derive(Debug)]
pub struct Generation<T> {
    items: Vec<T>,
    status: LoadStatus,
    latest: u64,
    // registry revision the current items (or in-flight request) belong to
    revision: Option<u64>,
}

impl<T> Generation<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            status: LoadStatus::Idle,
            latest: 0,
            revision: None,
        }
    }

    /// Start a request for the given registry revision; supersedes any in flight
    pub fn begin(&mut self, revision: u64) -> Ticket {
        self.latest += 1;
        self.revision = Some(revision);
        self.status = LoadStatus::Loading;
        Ticket {
            seq: self.latest,
            revision,
        }
    }

    /// Apply a finished request. Returns false (and changes nothing) for a superseded ticket.
    pub fn complete(&mut self, ticket: Ticket, result: Result<Vec<T>, String>) -> bool {
        if ticket.seq != self.latest {
            debug!(
                stale = ticket.seq,
                latest = self.latest,
                "Dropping superseded generation response"
            );
            return false;
        }

        match result {
            Ok(items) => {
                self.items = items;
                self.status = LoadStatus::Ready;
            }
            Err(message) => {
                self.items.clear();
                self.status = LoadStatus::Failed(message);
            }
        }
        true
    }

    /// Whether the loaded (or loading) set was requested for this revision
    pub fn is_current(&self, revision: u64) -> bool {
        self.revision == Some(revision)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }
}

impl<T> Default for Generation<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_generation_is_not_current() {
        let gen: Generation<u32> = Generation::new();
        assert!(!gen.is_current(1));
        assert_eq!(gen.status(), &LoadStatus::Idle);
    }

    #[test]
    fn test_complete_replaces_items() {
        let mut gen = Generation::new();
        let t = gen.begin(1);
        assert!(gen.is_loading());
        assert!(gen.complete(t, Ok(vec![1, 2, 3])));
        assert_eq!(gen.items(), &[1, 2, 3]);

        let t = gen.begin(2);
        assert!(gen.complete(t, Ok(vec![9])));
        assert_eq!(gen.items(), &[9]);
        assert!(gen.is_current(2));
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut gen = Generation::new();
        let old = gen.begin(1);
        let new = gen.begin(2);

        assert!(gen.complete(new, Ok(vec!["new"])));
        assert!(!gen.complete(old, Ok(vec!["old"])));
        assert_eq!(gen.items(), &["new"]);
        assert_eq!(gen.status(), &LoadStatus::Ready);
    }

    #[test]
    fn test_stale_failure_does_not_clobber_loading() {
        let mut gen: Generation<u8> = Generation::new();
        let old = gen.begin(1);
        let _new = gen.begin(2);

        assert!(!gen.complete(old, Err("boom".to_string())));
        assert!(gen.is_loading());
    }

    #[test]
    fn test_failure_clears_items() {
        let mut gen = Generation::new();
        let t = gen.begin(1);
        gen.complete(t, Ok(vec![1]));
        let t = gen.begin(1);
        gen.complete(t, Err("Failed to generate quiz".to_string()));

        assert!(gen.items().is_empty());
        assert_eq!(
            gen.status(),
            &LoadStatus::Failed("Failed to generate quiz".to_string())
        );
    }
}
