use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::BackendError;
use crate::models::{Attachment, AttachmentKind, ConversationStore, Message, Role};
use crate::services::data_url::parse_data_url;
use crate::services::gemini_service::{ChatBackend, OutboundRequest, RequestKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Input was empty after trimming
    Empty,
    /// A previous submission is still in flight
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    Replied(Message),
    Failed(BackendError),
}

/// Prompt used when a PDF's text accompanies the question
pub fn document_prompt(extracted_text: &str, message: &str) -> String {
    format!(
        "The following is the content of a PDF document I'd like you to help me with:\n\n{}\n\nMy question is: {}",
        extracted_text, message
    )
}

/// Pick the request shape for a submission based on the staged attachment
pub fn build_request(
    history: Vec<Message>,
    prompt: String,
    attachment: Option<&Attachment>,
) -> Result<OutboundRequest, BackendError> {
    let Some(attachment) = attachment else {
        return Ok(OutboundRequest::Text { history, prompt });
    };

    match &attachment.kind {
        AttachmentKind::Image => {
            let image = parse_data_url(&attachment.url).ok_or(BackendError::InvalidImage)?;
            Ok(OutboundRequest::Vision {
                history,
                prompt,
                image,
            })
        }
        AttachmentKind::Document { extracted_text } if !extracted_text.trim().is_empty() => {
            Ok(OutboundRequest::Text {
                history,
                prompt: document_prompt(extracted_text, &prompt),
            })
        }
        AttachmentKind::Document { .. } => Ok(OutboundRequest::Text { history, prompt }),
    }
}

/// Turns one user submission into exactly one backend request and its outcome
pub struct ConversationController {
    store: ConversationStore,
    backend: Arc<dyn ChatBackend>,
}

impl ConversationController {
    pub fn new(store: ConversationStore, backend: Arc<dyn ChatBackend>) -> Self {
        Self { store, backend }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let prompt = text.trim();
        if prompt.is_empty() {
            return SubmitOutcome::Ignored(IgnoreReason::Empty);
        }
        if self.store.is_loading() {
            debug!("Submission ignored while a reply is pending");
            return SubmitOutcome::Ignored(IgnoreReason::Busy);
        }

        let history = self.store.history();
        let attachment = self.store.attachment();

        self.store.append(Role::User, prompt);
        self.store.set_loading(true);

        let result = match build_request(history, prompt.to_string(), attachment.as_ref()) {
            Ok(request) => {
                info!(
                    vision = request.is_vision(),
                    history_len = request.history().len(),
                    "Submitting message"
                );
                self.backend.send(&request).await
            }
            Err(error) => {
                let kind = match attachment.as_ref().map(|a| &a.kind) {
                    Some(AttachmentKind::Image) => RequestKind::Vision,
                    _ => RequestKind::Text,
                };
                self.backend.mask_failure(kind, &error).ok_or(error)
            }
        };

        let outcome = match result {
            Ok(reply) => SubmitOutcome::Replied(self.store.append(Role::Model, reply)),
            Err(error) => {
                warn!(error = %error, "Submission failed");
                self.store.set_error(Some(error.to_string()));
                SubmitOutcome::Failed(error)
            }
        };

        self.store.set_loading(false);
        outcome
    }
}
