use cognify_core::{
    BackendClient, ContentRegistry, Conversation, Flashcard, FlashcardDeck, Generation,
    IngestForm, IngestKind, IngestRejected, QuizQuestion, QuizSession,
};
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::tui::{BackendEvent, BackendSender};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Upload,
    Flashcards,
    Quiz,
    Chat,
}

impl Screen {
    pub fn all() -> [Screen; 4] {
        [Screen::Upload, Screen::Flashcards, Screen::Quiz, Screen::Chat]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Upload => "Upload Content",
            Screen::Flashcards => "Flashcards",
            Screen::Quiz => "Quiz",
            Screen::Chat => "Chat",
        }
    }

    /// Everything but Upload needs at least one ingested item
    pub fn needs_content(&self) -> bool {
        *self != Screen::Upload
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadField {
    Url,
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Unknown,
    Online(String),
    Offline,
}

/// State that lives for the whole session and is shared by the views
pub struct Session {
    pub registry: ContentRegistry,
    pub conversation: Conversation,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub session: Session,
    registry_rx: watch::Receiver<u64>,

    // Upload state
    pub ingest: IngestForm,
    pub upload_field: UploadField,
    pub url_cursor: usize,
    pub path_cursor: usize,
    pub upload_hint: Option<&'static str>,

    // Study aid state
    pub flashcard_set: Generation<Flashcard>,
    pub deck: FlashcardDeck,
    pub quiz_set: Generation<QuizQuestion>,
    pub quiz: QuizSession,

    // Chat state
    pub chat_input: String,
    pub chat_cursor: usize,
    pub chat_scroll: u16,
    pub chat_follow: bool, // Keep the newest text in view until the user scrolls
    pub chat_height: u16, // Height of transcript area for scroll calculations
    pub chat_width: u16,  // Width of transcript area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub backend_status: BackendStatus,
    pub status_line: Option<String>,

    client: BackendClient,
    events: BackendSender,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(client: BackendClient, events: BackendSender) -> Self {
        let registry = ContentRegistry::new();
        let registry_rx = registry.subscribe();

        Self {
            should_quit: false,
            screen: Screen::Upload,
            input_mode: InputMode::Normal,
            session: Session {
                registry,
                conversation: Conversation::new(),
            },
            registry_rx,

            ingest: IngestForm::new(),
            upload_field: UploadField::Url,
            url_cursor: 0,
            path_cursor: 0,
            upload_hint: None,

            flashcard_set: Generation::new(),
            deck: FlashcardDeck::new(),
            quiz_set: Generation::new(),
            quiz: QuizSession::new(),

            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_follow: true,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            backend_status: BackendStatus::Unknown,
            status_line: None,

            client,
            events,
            shutdown: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    pub fn has_content(&self) -> bool {
        self.session.registry.has_content()
    }

    pub fn backend_url(&self) -> &str {
        self.client.base_url()
    }

    // Screen switching

    /// Switch screens; study views stay locked until something is ingested
    pub fn switch_to(&mut self, screen: Screen) -> bool {
        if screen.needs_content() && !self.has_content() {
            self.status_line = Some("Upload a video or PDF first".to_string());
            return false;
        }
        self.screen = screen;
        self.input_mode = InputMode::Normal;
        self.status_line = None;
        self.refresh_active_view();
        true
    }

    pub fn next_screen(&mut self) {
        self.cycle_screen(1);
    }

    pub fn prev_screen(&mut self) {
        self.cycle_screen(Screen::all().len() - 1);
    }

    fn cycle_screen(&mut self, step: usize) {
        let screens = Screen::all();
        let current = screens.iter().position(|s| *s == self.screen).unwrap_or(0);
        let target = screens[(current + step) % screens.len()];
        self.switch_to(target);
    }

    // Backend requests

    pub fn check_backend(&mut self) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.spawn(async move {
            events.send(BackendEvent::Banner(client.ping().await));
        });
    }

    pub fn submit_upload(&mut self) {
        self.upload_hint = None;
        let submitted = match self.upload_field {
            UploadField::Url => self.ingest.begin_video().map(|url| {
                let client = self.client.clone();
                let events = self.events.clone();
                self.spawn(async move {
                    let result = client.process_video(&url).await;
                    events.send(BackendEvent::Ingested {
                        kind: IngestKind::Video,
                        result,
                    });
                });
            }),
            UploadField::Document => self.ingest.begin_document().map(|path| {
                let client = self.client.clone();
                let events = self.events.clone();
                self.spawn(async move {
                    let result = client.process_pdf(&path).await;
                    events.send(BackendEvent::Ingested {
                        kind: IngestKind::Document,
                        result,
                    });
                });
            }),
        };

        if let Err(rejected) = submitted {
            self.upload_hint = Some(match (rejected, self.upload_field) {
                (IngestRejected::Busy, _) => "Still processing the previous upload",
                (IngestRejected::Empty, UploadField::Url) => "Enter a video URL first",
                (IngestRejected::Empty, UploadField::Document) => "Enter the path to a PDF first",
                (IngestRejected::MissingFile, _) => "No file at that path",
            });
        }
    }

    pub fn request_flashcards(&mut self) {
        let revision = self.session.registry.revision();
        let ticket = self.flashcard_set.begin(revision);
        let ids = self.session.registry.ids().to_vec();
        let client = self.client.clone();
        let events = self.events.clone();
        debug!(seq = ticket.seq, revision, "Requesting flashcards");

        self.spawn(async move {
            let result = client
                .generate_flashcards(&ids)
                .await
                .map_err(|e| e.user_message("Failed to generate flashcards"));
            events.send(BackendEvent::Flashcards { ticket, result });
        });
    }

    pub fn request_quiz(&mut self) {
        let revision = self.session.registry.revision();
        let ticket = self.quiz_set.begin(revision);
        let ids = self.session.registry.ids().to_vec();
        let client = self.client.clone();
        let events = self.events.clone();
        debug!(seq = ticket.seq, revision, "Requesting quiz");

        self.spawn(async move {
            let result = client
                .generate_quiz(&ids)
                .await
                .map_err(|e| e.user_message("Failed to generate quiz"));
            events.send(BackendEvent::Quiz { ticket, result });
        });
    }

    pub fn send_chat_message(&mut self) {
        let ids = self.session.registry.ids().to_vec();
        let Some(exchange) = self.session.conversation.begin(&self.chat_input, &ids) else {
            return;
        };

        self.chat_input.clear();
        self.chat_cursor = 0;
        self.input_mode = InputMode::Normal;
        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        let events = self.events.clone();
        let cancel = self.shutdown.child_token();
        let seq = exchange.seq;

        self.spawn(async move {
            let mut reader = match client.chat(&exchange.request, cancel).await {
                Ok(reader) => reader,
                Err(e) => {
                    events.send(BackendEvent::ChatFailed {
                        seq,
                        reason: e.to_string(),
                    });
                    return;
                }
            };
            events.send(BackendEvent::ChatOpened { seq });

            while let Some(item) = reader.next().await {
                match item {
                    Ok(text) => events.send(BackendEvent::ChatFragment { seq, text }),
                    Err(e) => {
                        events.send(BackendEvent::ChatFailed {
                            seq,
                            reason: e.to_string(),
                        });
                        return;
                    }
                }
            }
            events.send(BackendEvent::ChatFinished { seq });
        });
    }

    /// Apply a result reported by a background task
    pub fn apply_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Banner(Ok(message)) => {
                info!(%message, "Backend reachable");
                self.backend_status = BackendStatus::Online(message);
            }
            BackendEvent::Banner(Err(e)) => {
                warn!(error = %e, "Backend not reachable");
                self.backend_status = BackendStatus::Offline;
            }
            BackendEvent::Ingested { kind, result } => {
                if let Err(e) = &result {
                    warn!(?kind, error = %e, "Ingestion failed");
                }
                if let Some(id) = self.ingest.complete(kind, result) {
                    self.session.registry.register(id);
                    self.upload_hint = None;
                }
            }
            BackendEvent::Flashcards { ticket, result } => {
                if self.flashcard_set.complete(ticket, result) {
                    self.deck.load(self.flashcard_set.items().to_vec());
                }
            }
            BackendEvent::Quiz { ticket, result } => {
                if self.quiz_set.complete(ticket, result) {
                    self.quiz.load(self.quiz_set.items().to_vec());
                }
            }
            BackendEvent::ChatOpened { seq } => {
                self.session.conversation.stream_opened(seq);
            }
            BackendEvent::ChatFragment { seq, text } => {
                if self.session.conversation.append_fragment(seq, &text) {
                    self.scroll_chat_to_bottom();
                }
            }
            BackendEvent::ChatFinished { seq } => {
                self.session.conversation.finish(seq);
                self.scroll_chat_to_bottom();
            }
            BackendEvent::ChatFailed { seq, reason } => {
                warn!(seq, %reason, "Chat stream failed");
                self.session.conversation.fail(seq);
                self.scroll_chat_to_bottom();
            }
        }
    }

    /// React to registry changes: generation views that are in use re-request
    /// for the new identifier list.
    pub fn sync_with_registry(&mut self) {
        if !self.registry_rx.has_changed().unwrap_or(false) {
            return;
        }
        let revision = *self.registry_rx.borrow_and_update();
        debug!(revision, "Content list changed");

        if self.flashcard_set.status() != &cognify_core::LoadStatus::Idle
            && !self.flashcard_set.is_current(revision)
        {
            self.request_flashcards();
        }
        if self.quiz_set.status() != &cognify_core::LoadStatus::Idle
            && !self.quiz_set.is_current(revision)
        {
            self.request_quiz();
        }
    }

    /// First visit to a study view loads it
    fn refresh_active_view(&mut self) {
        let revision = self.session.registry.revision();
        match self.screen {
            Screen::Flashcards if !self.flashcard_set.is_current(revision) => self.request_flashcards(),
            Screen::Quiz if !self.quiz_set.is_current(revision) => self.request_quiz(),
            _ => {}
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Anything the spinner should run for
    pub fn is_waiting(&self) -> bool {
        self.session.conversation.is_busy()
            || self.ingest.is_busy()
            || self.flashcard_set.is_loading()
            || self.quiz_set.is_loading()
    }

    /// Scroll chat to bottom so the newest text is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_follow = true;

        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };
        let total_lines = ui::transcript_height(
            &self.session.conversation,
            self.animation_frame,
            wrap_width,
        );

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    /// Manual scroll; stops following new text
    pub fn scroll_chat_by(&mut self, delta: i32) {
        self.chat_follow = false;
        self.chat_scroll = if delta < 0 {
            self.chat_scroll.saturating_sub(delta.unsigned_abs() as u16)
        } else {
            self.chat_scroll.saturating_add(delta as u16)
        };
    }

    fn spawn(&mut self, task: impl Future<Output = ()> + Send + 'static) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(tokio::spawn(task));
    }

    /// Stop streams and drop anything still in flight
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("Background tasks stopped");
    }
}
