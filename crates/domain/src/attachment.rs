//! Attachment payload validation.

use redressa_core::{AppError, AppResult, NonEmptyString};

/// Maximum number of attachments a single grievance may carry.
pub const MAX_ATTACHMENTS_PER_GRIEVANCE: usize = 5;

/// Media types accepted for grievance attachments: documents and images.
const ACCEPTED_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
];

/// Returns whether the media type is accepted for upload.
#[must_use]
pub fn is_accepted_media_type(value: &str) -> bool {
    // Media types are case-insensitive per RFC 2045.
    ACCEPTED_MEDIA_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(value.trim()))
}

/// A validated attachment payload awaiting upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    file_name: NonEmptyString,
    content_type: String,
    bytes: Vec<u8>,
}

impl AttachmentUpload {
    /// Creates a validated attachment payload.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> AppResult<Self> {
        let content_type = content_type.into().trim().to_ascii_lowercase();

        if !is_accepted_media_type(&content_type) {
            return Err(AppError::Validation(format!(
                "media type '{content_type}' is not accepted for attachments"
            )));
        }

        if bytes.is_empty() {
            return Err(AppError::Validation(
                "attachment payload must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            file_name: NonEmptyString::new(file_name)?,
            content_type,
            bytes,
        })
    }

    /// Returns the original file name.
    #[must_use]
    pub fn file_name(&self) -> &NonEmptyString {
        &self.file_name
    }

    /// Returns the normalized media type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// Returns the raw payload bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Consumes the attachment, returning the payload bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::{AttachmentUpload, is_accepted_media_type};

    #[test]
    fn document_and_image_types_are_accepted() {
        assert!(is_accepted_media_type("application/pdf"));
        assert!(is_accepted_media_type("image/png"));
        assert!(is_accepted_media_type("IMAGE/JPEG"));
    }

    #[test]
    fn other_media_types_are_rejected() {
        assert!(!is_accepted_media_type("video/mp4"));
        assert!(!is_accepted_media_type("text/html"));
        assert!(!is_accepted_media_type(""));
    }

    #[test]
    fn attachment_rejects_unaccepted_type() {
        let result = AttachmentUpload::new("clip.mp4", "video/mp4", vec![1, 2, 3]);
        assert!(result.is_err());
    }

    #[test]
    fn attachment_rejects_empty_payload() {
        let result = AttachmentUpload::new("scan.pdf", "application/pdf", Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn attachment_normalizes_content_type() {
        let result = AttachmentUpload::new("photo.JPG", "Image/JPEG", vec![0xFF]);
        assert!(result.is_ok_and(|attachment| attachment.content_type() == "image/jpeg"));
    }
}
