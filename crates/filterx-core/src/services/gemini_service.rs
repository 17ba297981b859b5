use async_trait::async_trait;
use futures::StreamExt;
use rig::OneOrMany;
use rig::agent::{Agent, AgentBuilder};
use rig::completion::Message as RigMessage;
use rig::completion::message::{AssistantContent, ImageDetail, ImageMediaType, Text};
use rig::message::UserContent;
use rig::providers::gemini;
use rig::streaming::StreamingPrompt;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::data_url::InlineImage;
use super::gemini_http::GeminiHttpClient;
use crate::error::BackendError;
use crate::models::{Message, Role};
use crate::settings::ChatSettings;

pub const TEXT_FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting to my AI brain right now. Please try again later.";
pub const IMAGE_FALLBACK_REPLY: &str = "Sorry, I'm having trouble processing the image. Please try again with a different image or question.";
pub const EMPTY_IMAGE_REPLY: &str = "Sorry, the image analysis didn't yield a response.";
pub const INVALID_IMAGE_REPLY: &str = "Error: Invalid image URL format.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Text,
    Vision,
}

/// One request to the model, built from a single submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRequest {
    Text {
        history: Vec<Message>,
        prompt: String,
    },
    Vision {
        history: Vec<Message>,
        prompt: String,
        image: InlineImage,
    },
}

impl OutboundRequest {
    pub fn history(&self) -> &[Message] {
        match self {
            OutboundRequest::Text { history, .. } | OutboundRequest::Vision { history, .. } => {
                history
            }
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            OutboundRequest::Text { prompt, .. } | OutboundRequest::Vision { prompt, .. } => prompt,
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            OutboundRequest::Text { .. } => RequestKind::Text,
            OutboundRequest::Vision { .. } => RequestKind::Vision,
        }
    }

    pub fn is_vision(&self) -> bool {
        self.kind() == RequestKind::Vision
    }
}

/// Something that turns an outbound request into reply text
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<String, BackendError>;

    /// Reply to show in place of a failure that happened before `send`.
    ///
    /// `None` leaves the failure visible to the user.
    fn mask_failure(&self, _kind: RequestKind, _error: &BackendError) -> Option<String> {
        None
    }
}

/// Convert stored messages into rig history, dropping nothing
pub fn to_rig_history(history: &[Message]) -> Vec<RigMessage> {
    history
        .iter()
        .map(|message| match message.role() {
            Role::User => RigMessage::User {
                content: OneOrMany::one(UserContent::Text(Text {
                    text: message.content().to_string(),
                })),
            },
            Role::Model => RigMessage::Assistant {
                id: None,
                content: OneOrMany::one(AssistantContent::Text(Text {
                    text: message.content().to_string(),
                })),
            },
        })
        .collect()
}

fn image_media_type(mime_type: &str) -> Option<ImageMediaType> {
    match mime_type.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some(ImageMediaType::JPEG),
        "image/png" => Some(ImageMediaType::PNG),
        "image/webp" => Some(ImageMediaType::WEBP),
        "image/gif" => Some(ImageMediaType::GIF),
        _ => None,
    }
}

/// Content blocks of the user turn for a request
pub fn user_contents(request: &OutboundRequest) -> Result<Vec<UserContent>, BackendError> {
    match request {
        OutboundRequest::Text { prompt, .. } => Ok(vec![UserContent::Text(Text {
            text: prompt.clone(),
        })]),
        OutboundRequest::Vision { prompt, image, .. } => {
            let media_type =
                image_media_type(&image.mime_type).ok_or(BackendError::InvalidImage)?;
            Ok(vec![
                UserContent::Text(Text {
                    text: prompt.clone(),
                }),
                UserContent::image_base64(
                    image.data.clone(),
                    Some(media_type),
                    Some(ImageDetail::Auto),
                ),
            ])
        }
    }
}

fn safety_settings() -> serde_json::Value {
    let categories = [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ];
    let settings: Vec<_> = categories
        .iter()
        .map(|category| json!({ "category": category, "threshold": "BLOCK_MEDIUM_AND_ABOVE" }))
        .collect();
    json!({ "safetySettings": settings })
}

/// Gemini access through rig
pub struct GeminiBackend {
    api_key: Option<String>,
    model: String,
    vision_model: String,
}

impl GeminiBackend {
    pub fn new(settings: &ChatSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            vision_model: settings.vision_model.clone(),
        }
    }

    pub fn model_for(&self, request: &OutboundRequest) -> &str {
        if request.is_vision() {
            &self.vision_model
        } else {
            &self.model
        }
    }

    fn build_agent(
        &self,
        model: &str,
    ) -> Result<Agent<gemini::completion::CompletionModel<GeminiHttpClient>>, BackendError> {
        let key = self.api_key.as_deref().ok_or(BackendError::MissingApiKey)?;
        let client = gemini::Client::builder()
            .http_client(GeminiHttpClient::default())
            .api_key(key)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        let completion_model = gemini::completion::CompletionModel::new(client, model);
        Ok(AgentBuilder::new(completion_model)
            .additional_params(safety_settings())
            .build())
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn send(&self, request: &OutboundRequest) -> Result<String, BackendError> {
        let model = self.model_for(request);
        let agent = self.build_agent(model)?;

        let contents = user_contents(request)?;
        let user_message = RigMessage::User {
            content: OneOrMany::many(contents)
                .map_err(|e| BackendError::Request(e.to_string()))?,
        };
        let history = to_rig_history(request.history());

        debug!(model, history_len = history.len(), vision = request.is_vision(), "Sending Gemini request");

        let mut stream = agent
            .stream_prompt(user_message)
            .with_history(history)
            .multi_turn(1)
            .await;

        let mut response = String::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(rig::agent::MultiTurnStreamItem::StreamAssistantItem(
                    rig::streaming::StreamedAssistantContent::Text(text),
                )) => response.push_str(&text.text),
                Err(e) => {
                    warn!(error = %e, model, "Gemini request failed");
                    return Err(BackendError::Request(e.to_string()));
                }
                _ => {}
            }
        }

        if response.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        info!(model, chars = response.len(), "Gemini reply received");
        Ok(response)
    }
}

/// Replaces backend failures with apology replies.
///
/// With this in place the controller sees every failure as a normal reply.
pub struct FallbackBackend<B> {
    inner: B,
}

impl<B: ChatBackend> FallbackBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

pub fn fallback_reply(kind: RequestKind, error: &BackendError) -> &'static str {
    match (kind, error) {
        (RequestKind::Vision, BackendError::EmptyResponse) => EMPTY_IMAGE_REPLY,
        (RequestKind::Vision, BackendError::InvalidImage) => INVALID_IMAGE_REPLY,
        (RequestKind::Vision, _) => IMAGE_FALLBACK_REPLY,
        (RequestKind::Text, _) => TEXT_FALLBACK_REPLY,
    }
}

#[async_trait]
impl<B: ChatBackend> ChatBackend for FallbackBackend<B> {
    async fn send(&self, request: &OutboundRequest) -> Result<String, BackendError> {
        match self.inner.send(request).await {
            Ok(reply) => Ok(reply),
            Err(error) => {
                warn!(error = %error, "Masking backend failure with fallback reply");
                Ok(fallback_reply(request.kind(), &error).to_string())
            }
        }
    }

    fn mask_failure(&self, kind: RequestKind, error: &BackendError) -> Option<String> {
        warn!(error = %error, "Masking failed submission with fallback reply");
        Some(fallback_reply(kind, error).to_string())
    }
}

/// Gemini backend, wrapped in the fallback decorator when masking is enabled
pub fn backend_from_settings(settings: &ChatSettings) -> Arc<dyn ChatBackend> {
    let gemini = GeminiBackend::new(settings);
    if settings.mask_backend_errors {
        Arc::new(FallbackBackend::new(gemini))
    } else {
        Arc::new(gemini)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConversationStore;

    struct FailingBackend(BackendError);

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn send(&self, _request: &OutboundRequest) -> Result<String, BackendError> {
            Err(self.0.clone())
        }
    }

    fn text_request(prompt: &str) -> OutboundRequest {
        OutboundRequest::Text {
            history: Vec::new(),
            prompt: prompt.to_string(),
        }
    }

    fn vision_request(mime_type: &str) -> OutboundRequest {
        OutboundRequest::Vision {
            history: Vec::new(),
            prompt: "what is this?".to_string(),
            image: InlineImage {
                mime_type: mime_type.to_string(),
                data: "AAAA".to_string(),
            },
        }
    }

    #[test]
    fn test_history_conversion_keeps_roles_and_order() {
        let store = ConversationStore::new();
        store.append(Role::User, "Hello");
        store.append(Role::Model, "Hi there");

        let history = to_rig_history(&store.history());
        assert_eq!(history.len(), 2);
        assert!(matches!(history[0], RigMessage::User { .. }));
        assert!(matches!(history[1], RigMessage::Assistant { .. }));
    }

    #[test]
    fn test_vision_contents_include_image() {
        let contents = user_contents(&vision_request("image/png")).unwrap();
        assert_eq!(contents.len(), 2);
        assert!(matches!(contents[0], UserContent::Text(_)));
        assert!(matches!(contents[1], UserContent::Image(_)));
    }

    #[test]
    fn test_vision_rejects_unknown_image_type() {
        assert_eq!(
            user_contents(&vision_request("image/tiff")).unwrap_err(),
            BackendError::InvalidImage
        );
    }

    #[test]
    fn test_model_selection() {
        let backend = GeminiBackend::new(&ChatSettings::default());
        assert_eq!(backend.model_for(&text_request("hi")), crate::settings::DEFAULT_MODEL);
        assert_eq!(
            backend.model_for(&vision_request("image/png")),
            crate::settings::DEFAULT_VISION_MODEL
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_is_an_error() {
        let backend = GeminiBackend::new(&ChatSettings::default());
        let err = backend.send(&text_request("hi")).await.unwrap_err();
        assert_eq!(err, BackendError::MissingApiKey);
    }

    #[test]
    fn test_safety_settings_cover_four_categories() {
        let settings = safety_settings();
        let list = settings["safetySettings"].as_array().unwrap();
        assert_eq!(list.len(), 4);
        assert!(list.iter().all(|s| s["threshold"] == "BLOCK_MEDIUM_AND_ABOVE"));
    }

    #[test]
    fn test_request_body_carries_one_safety_settings_list() {
        use crate::services::gemini_http::collapse_duplicate_keys;
        use rig::providers::gemini::completion::gemini_api_types::GenerateContentRequest;

        let request = GenerateContentRequest {
            contents: Vec::new(),
            tools: None,
            tool_config: None,
            generation_config: None,
            safety_settings: None,
            system_instruction: None,
            additional_params: Some(safety_settings()),
        };
        let body = serde_json::to_vec(&request).unwrap();
        let sent = collapse_duplicate_keys(body.into());

        assert_eq!(String::from_utf8_lossy(&sent).matches("\"safetySettings\":").count(), 1);
        let body: serde_json::Value = serde_json::from_slice(&sent).unwrap();
        assert_eq!(body["safetySettings"], safety_settings()["safetySettings"]);
    }

    #[tokio::test]
    async fn test_fallback_masks_text_failures() {
        let backend = FallbackBackend::new(FailingBackend(BackendError::Request(
            "rate limited".to_string(),
        )));
        let reply = backend.send(&text_request("hi")).await.unwrap();
        assert_eq!(reply, TEXT_FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_fallback_vision_replies() {
        let empty = FallbackBackend::new(FailingBackend(BackendError::EmptyResponse));
        assert_eq!(
            empty.send(&vision_request("image/png")).await.unwrap(),
            EMPTY_IMAGE_REPLY
        );

        let failed = FallbackBackend::new(FailingBackend(BackendError::Request("500".to_string())));
        assert_eq!(
            failed.send(&vision_request("image/png")).await.unwrap(),
            IMAGE_FALLBACK_REPLY
        );

        let invalid = FallbackBackend::new(FailingBackend(BackendError::InvalidImage));
        assert_eq!(
            invalid.send(&vision_request("image/png")).await.unwrap(),
            INVALID_IMAGE_REPLY
        );
    }
}
