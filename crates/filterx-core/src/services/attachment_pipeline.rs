//! Attachment ingestion
//!
//! Validates a dropped or selected file, converts it into a data URL,
//! extracts text from PDFs and stages the result in the conversation store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::data_url::encode_data_url;
use super::pdf_text::TextExtractor;
use crate::error::{AttachmentError, AttachmentResult, ValidationError};
use crate::models::attachment::{MIME_PDF, mime_type_for_extension};
use crate::models::{Attachment, AttachmentKind, ConversationStore, Notice};
use crate::settings::UploadLimits;

/// A file offered to the pipeline, described before its bytes are read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub path: PathBuf,
}

impl FileCandidate {
    /// Describe a file on disk; the MIME type comes from its extension
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = path
            .extension()
            .map(|ext| mime_type_for_extension(&ext.to_string_lossy()))
            .unwrap_or("application/octet-stream");

        Ok(Self {
            name,
            mime_type: mime_type.to_string(),
            size: metadata.len(),
            path: path.to_path_buf(),
        })
    }
}

/// Clears the processing flag when dropped
struct ProcessingGuard {
    flag: Arc<AtomicBool>,
    store: ConversationStore,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        self.store.processing_changed(false);
    }
}

pub struct AttachmentPipeline {
    store: ConversationStore,
    extractor: Arc<dyn TextExtractor>,
    limits: UploadLimits,
    processing: Arc<AtomicBool>,
}

impl AttachmentPipeline {
    pub fn new(
        store: ConversationStore,
        extractor: Arc<dyn TextExtractor>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            store,
            extractor,
            limits,
            processing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// False while a file is attached or still being processed
    pub fn is_enabled(&self) -> bool {
        !self.is_processing() && !self.store.has_attachment()
    }

    /// Check the drop against the current state and limits without reading anything
    pub fn validate(&self, files: &[FileCandidate]) -> Result<(), ValidationError> {
        if self.store.has_attachment() {
            return Err(ValidationError::AlreadyAttached);
        }
        if self.is_processing() {
            return Err(ValidationError::Processing);
        }
        if files.len() > self.limits.max_files {
            return Err(ValidationError::TooManyFiles {
                count: files.len(),
                max: self.limits.max_files,
            });
        }

        for file in files {
            if file.size > self.limits.max_size {
                return Err(ValidationError::FileTooLarge {
                    size: file.size,
                    max: self.limits.max_size,
                });
            }
            if !self.limits.allows(&file.mime_type) {
                return Err(ValidationError::UnsupportedType {
                    mime_type: file.mime_type.clone(),
                    allowed: self.limits.allowed_types.clone(),
                });
            }
        }

        Ok(())
    }

    /// Validate, convert and stage a drop.
    ///
    /// Emits exactly one notice per non-empty drop. An empty drop is a no-op
    /// and returns `Ok(None)`.
    pub async fn ingest(&self, files: Vec<FileCandidate>) -> AttachmentResult<Option<Attachment>> {
        if files.is_empty() {
            return Ok(None);
        }

        let result = self.try_ingest(files).await;

        match &result {
            Ok(attachment) => {
                info!(name = %attachment.name, mime_type = %attachment.mime_type, "Attachment staged");
                self.store
                    .notify(Notice::success(format!("{} uploaded successfully", attachment.name)));
            }
            Err(err) => {
                warn!(error = %err, "Attachment rejected");
                self.store.notify(Notice::error(err.user_message()));
            }
        }

        result.map(Some)
    }

    async fn try_ingest(&self, files: Vec<FileCandidate>) -> AttachmentResult<Attachment> {
        self.validate(&files)?;

        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ValidationError::Processing.into());
        }
        let _guard = ProcessingGuard {
            flag: self.processing.clone(),
            store: self.store.clone(),
        };
        self.store.processing_changed(true);

        let Some(file) = files.into_iter().next() else {
            return Err(ValidationError::TooManyFiles { count: 0, max: 1 }.into());
        };

        debug!(name = %file.name, size = file.size, "Reading attachment");
        let bytes = tokio::fs::read(&file.path).await?;
        let url = encode_data_url(&file.mime_type, &bytes);

        let kind = if file.mime_type.eq_ignore_ascii_case(MIME_PDF) {
            let extracted_text = self
                .extractor
                .extract_text(bytes.clone())
                .await
                .map_err(|e| AttachmentError::ExtractionFailed(e.to_string()))?;
            debug!(chars = extracted_text.len(), "PDF text extracted");
            AttachmentKind::Document { extracted_text }
        } else {
            AttachmentKind::Image
        };

        let attachment = Attachment {
            id: Uuid::new_v4(),
            name: file.name,
            mime_type: file.mime_type,
            size: bytes.len() as u64,
            url,
            kind,
        };

        self.store.set_attachment(Some(attachment.clone()));
        Ok(attachment)
    }

    /// Drop the staged attachment
    pub fn remove(&self) {
        self.store.clear_attachment();
    }
}
