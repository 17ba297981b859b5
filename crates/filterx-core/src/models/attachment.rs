use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";
pub const MIME_WEBP: &str = "image/webp";
pub const MIME_PDF: &str = "application/pdf";

/// What the attachment carries into the next request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    Image,
    Document { extracted_text: String },
}

/// A single staged file, ready to be sent with the next message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// `data:<mime>;base64,<payload>`
    pub url: String,
    pub kind: AttachmentKind,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        matches!(self.kind, AttachmentKind::Image)
    }

    /// Extracted text for documents, `None` for images
    pub fn extracted_text(&self) -> Option<&str> {
        match &self.kind {
            AttachmentKind::Image => None,
            AttachmentKind::Document { extracted_text } => Some(extracted_text),
        }
    }

    /// "Image" or "PDF Document" followed by the size in KB
    pub fn describe(&self) -> String {
        let label = match self.kind {
            AttachmentKind::Image => "Image",
            AttachmentKind::Document { .. } => "PDF Document",
        };
        format!("{} • {:.1} KB", label, self.size as f64 / 1024.0)
    }
}

/// Map a file extension to the MIME type used for validation
pub fn mime_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => MIME_JPEG,
        "png" => MIME_PNG,
        "webp" => MIME_WEBP,
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "pdf" => MIME_PDF,
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
