use std::io::{self, Stderr};
use anyhow::Result;
use cognify_core::{ApiError, ContentId, Flashcard, IngestKind, QuizQuestion, Ticket};
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Backend(BackendEvent),
}

/// Results reported back by spawned request tasks
#[derive(Debug)]
pub enum BackendEvent {
    Banner(Result<String, ApiError>),
    Ingested {
        kind: IngestKind,
        result: Result<ContentId, ApiError>,
    },
    Flashcards {
        ticket: Ticket,
        result: Result<Vec<Flashcard>, String>,
    },
    Quiz {
        ticket: Ticket,
        result: Result<Vec<QuizQuestion>, String>,
    },
    ChatOpened { seq: u64 },
    ChatFragment { seq: u64, text: String },
    ChatFinished { seq: u64 },
    ChatFailed { seq: u64, reason: String },
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // Spawn event reader task
        let tx_events = tx.clone();
        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            while let Some(evt) = reader.next().await {
                let app_event = match evt {
                    // Only handle key press events, not release
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                    Ok(Event::Resize(_, _)) => Some(AppEvent::Resize),
                    _ => None,
                };

                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        // Tick timer for the "Thinking..." animation (300ms interval)
        let tx_tick = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(300));
            loop {
                interval.tick().await;
                if tx_tick.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    /// Sender for background tasks to report into the UI loop
    pub fn sender(&self) -> BackendSender {
        BackendSender::new(self.tx.clone())
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

#[derive(Clone)]
pub struct BackendSender(mpsc::UnboundedSender<AppEvent>);

impl BackendSender {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self(tx)
    }

    /// Delivery fails only once the UI loop is gone, which is fine to ignore
    pub fn send(&self, event: BackendEvent) {
        let _ = self.0.send(AppEvent::Backend(event));
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
