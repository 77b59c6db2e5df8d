//! Upload form state for the two ingestion flows (video link, PDF file)
//!
//! Both flows share one in-flight flag: while anything is being processed,
//! neither form can be submitted again.

use std::path::{Path, PathBuf};

use crate::error::ApiError;
use crate::registry::ContentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestKind {
    Video,
    Document,
}

impl IngestKind {
    pub fn success_message(&self) -> &'static str {
        match self {
            IngestKind::Video => "Video processed successfully!",
            IngestKind::Document => "PDF processed successfully!",
        }
    }

    pub fn failure_fallback(&self) -> &'static str {
        match self {
            IngestKind::Video => "Failed to process video",
            IngestKind::Document => "Failed to process PDF",
        }
    }
}

/// Inline feedback shown under the forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Why a submission never left the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestRejected {
    Empty,
    MissingFile,
    Busy,
}

#[derive(Debug, Default)]
pub struct IngestForm {
    pub url: String,
    pub document_path: String,
    in_flight: Option<IngestKind>,
    notice: Option<Notice>,
}

impl IngestForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_video(&mut self) -> Result<String, IngestRejected> {
        self.ensure_idle()?;
        let url = self.url.trim();
        if url.is_empty() {
            return Err(IngestRejected::Empty);
        }
        let url = url.to_string();
        self.start(IngestKind::Video);
        Ok(url)
    }

    pub fn begin_document(&mut self) -> Result<PathBuf, IngestRejected> {
        self.ensure_idle()?;
        let raw = self.document_path.trim();
        if raw.is_empty() {
            return Err(IngestRejected::Empty);
        }
        let path = expand_home(raw);
        if !path.is_file() {
            return Err(IngestRejected::MissingFile);
        }
        self.start(IngestKind::Document);
        Ok(path)
    }

    /// Apply the backend's answer. On success the field is cleared and the
    /// identifier handed back for registration.
    pub fn complete(
        &mut self,
        kind: IngestKind,
        result: Result<ContentId, ApiError>,
    ) -> Option<ContentId> {
        self.in_flight = None;
        match result {
            Ok(id) => {
                self.notice = Some(Notice::Success(kind.success_message().to_string()));
                match kind {
                    IngestKind::Video => self.url.clear(),
                    IngestKind::Document => self.document_path.clear(),
                }
                Some(id)
            }
            Err(e) => {
                self.notice = Some(Notice::Error(e.user_message(kind.failure_fallback())));
                None
            }
        }
    }

    pub fn in_flight(&self) -> Option<IngestKind> {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn ensure_idle(&self) -> Result<(), IngestRejected> {
        if self.is_busy() {
            Err(IngestRejected::Busy)
        } else {
            Ok(())
        }
    }

    fn start(&mut self, kind: IngestKind) {
        self.notice = None;
        self.in_flight = Some(kind);
    }
}

/// `~/notes.pdf` -> `$HOME/notes.pdf`
fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    Path::new(raw).to_path_buf()
}
