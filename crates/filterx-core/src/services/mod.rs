pub mod attachment_pipeline;
pub mod data_url;
pub mod gemini_http;
pub mod gemini_service;
pub mod pdf_text;
pub mod typewriter;

pub use attachment_pipeline::{AttachmentPipeline, FileCandidate};
pub use data_url::{InlineImage, encode_data_url, parse_data_url};
pub use gemini_service::{
    ChatBackend, FallbackBackend, GeminiBackend, OutboundRequest, RequestKind,
    backend_from_settings,
};
#[cfg(feature = "pdf")]
pub use pdf_text::PdfiumTextExtractor;
pub use pdf_text::TextExtractor;
pub use typewriter::Typewriter;
