//! Core of the FilterX chat client: session state, attachment handling and
//! Gemini request routing, with no UI dependencies.

pub mod controllers;
pub mod error;
pub mod models;
pub mod services;
pub mod settings;

pub use controllers::{ConversationController, IgnoreReason, SubmitOutcome};
pub use error::{AttachmentError, BackendError, ExtractionError, ValidationError};
pub use models::{Attachment, ConversationStore, Message, Notice, NoticeLevel, Role, StoreEvent};
pub use settings::ChatSettings;
