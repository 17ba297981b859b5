use serde::{Deserialize, Serialize};

use crate::models::attachment::{MIME_JPEG, MIME_PDF, MIME_PNG, MIME_WEBP};

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.0-flash";
pub const MAX_FILE_SIZE: u64 = 5_242_880; // 5MB

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadLimits {
    pub allowed_types: Vec<String>,
    pub max_size: u64,
    pub max_files: usize,
}

impl UploadLimits {
    pub fn allows(&self, mime_type: &str) -> bool {
        self.allowed_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            allowed_types: vec![
                MIME_JPEG.to_string(),
                MIME_PNG.to_string(),
                MIME_WEBP.to_string(),
                MIME_PDF.to_string(),
            ],
            max_size: MAX_FILE_SIZE,
            max_files: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypewriterSettings {
    pub chars_per_tick: usize,
    pub tick_interval_ms: u64,
}

impl Default for TypewriterSettings {
    fn default() -> Self {
        Self {
            chars_per_tick: 3,
            tick_interval_ms: 16,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub vision_model: String,
    pub upload: UploadLimits,
    pub typewriter: TypewriterSettings,
    /// Replace backend failures with apology text instead of surfacing them
    pub mask_backend_errors: bool,
}

impl ChatSettings {
    /// Defaults plus the API key from `GEMINI_API_KEY`
    pub fn from_env() -> Self {
        Self::default().with_api_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Blank keys are treated as missing
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            upload: UploadLimits::default(),
            typewriter: TypewriterSettings::default(),
            mask_backend_errors: false,
        }
    }
}

impl std::fmt::Debug for ChatSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("vision_model", &self.vision_model)
            .field("upload", &self.upload)
            .field("typewriter", &self.typewriter)
            .field("mask_backend_errors", &self.mask_backend_errors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_upload_limits() {
        let limits = UploadLimits::default();
        assert_eq!(limits.max_size, 5 * 1024 * 1024);
        assert_eq!(limits.max_files, 1);
        assert!(limits.allows("image/png"));
        assert!(limits.allows("IMAGE/JPEG"));
        assert!(limits.allows("application/pdf"));
        assert!(!limits.allows("text/plain"));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let settings = ChatSettings::default().with_api_key(Some("   ".to_string()));
        assert!(settings.api_key.is_none());

        let settings = ChatSettings::default().with_api_key(Some(" key ".to_string()));
        assert_eq!(settings.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = ChatSettings::default().with_api_key(Some("secret-key".to_string()));
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let settings = ChatSettings::default().with_api_key(Some("secret-key".to_string()));
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(json.contains(DEFAULT_MODEL));
    }
}
