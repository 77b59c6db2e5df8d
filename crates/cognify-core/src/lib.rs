pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod flashcards;
pub mod generation;
pub mod ingest;
pub mod quiz;
pub mod registry;
pub mod state;
pub mod stream;

// Re-export main types for convenience
pub use api::BackendClient;
pub use chat::{ChatRequest, Conversation, Exchange, ExchangeState, CHAT_ERROR_MESSAGE};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use flashcards::FlashcardDeck;
pub use generation::{Generation, LoadStatus, Ticket};
pub use ingest::{IngestForm, IngestKind, IngestRejected, Notice};
pub use quiz::{OptionMark, QuizSession};
pub use registry::{ContentId, ContentRegistry};
pub use state::{ChatMessage, ChatRole, Flashcard, QuizQuestion};
pub use stream::{Frame, FrameDecoder, FragmentReader};
