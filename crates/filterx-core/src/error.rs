use thiserror::Error;

/// Reasons a file is refused before any bytes are read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a file is already attached")]
    AlreadyAttached,

    #[error("a previous file is still being processed")]
    Processing,

    #[error("too many files: {count} dropped, at most {max} allowed")]
    TooManyFiles { count: usize, max: usize },

    #[error("file is too large: {size} bytes exceeds {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("unsupported file type: {mime_type}")]
    UnsupportedType {
        mime_type: String,
        allowed: Vec<String>,
    },
}

impl ValidationError {
    /// Text shown in the toast for this rejection
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::FileTooLarge { max, .. } => {
                format!("File is too large. Max size is {}MB", max / (1024 * 1024))
            }
            ValidationError::UnsupportedType { allowed, .. } => {
                format!("Invalid file type. Accepted: {}", allowed.join(", "))
            }
            ValidationError::AlreadyAttached
            | ValidationError::Processing
            | ValidationError::TooManyFiles { .. } => "File upload failed".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("text extraction failed: {0}")]
    ExtractionFailed(String),
}

impl AttachmentError {
    pub fn user_message(&self) -> String {
        match self {
            AttachmentError::Validation(err) => err.user_message(),
            AttachmentError::Read(_) => "Failed to upload file".to_string(),
            AttachmentError::ExtractionFailed(_) => "Failed to extract text from PDF".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("pdfium unavailable: {0}")]
    Binding(String),

    #[error("pdf could not be parsed: {0}")]
    Document(String),
}

/// Failures of the outbound generative-AI call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    #[error("Invalid image URL format")]
    InvalidImage,

    #[error("the model returned an empty response")]
    EmptyResponse,

    #[error("failed to create Gemini client: {0}")]
    Client(String),

    #[error("{0}")]
    Request(String),
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;
