//! In-memory video upload.

use axum::body::Bytes;
use thiserror::Error;

/// Rejections raised before any outbound call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("A video file is required.")]
    Missing,

    #[error("The uploaded video file is empty.")]
    Empty,

    #[error("The uploaded video is {size} bytes; the maximum is {max} bytes.")]
    TooLarge { size: usize, max: usize },
}

/// A client-submitted video held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct Upload {
    bytes: Bytes,
    mime_type: String,
    file_name: Option<String>,
}

impl Upload {
    /// Validate size bounds and wrap the buffer.
    ///
    /// The MIME type is kept verbatim; codecs are not checked.
    pub fn new(
        bytes: Bytes,
        mime_type: impl Into<String>,
        file_name: Option<String>,
        max_bytes: usize,
    ) -> Result<Self, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }

        Ok(Self {
            bytes,
            mime_type: mime_type.into(),
            file_name,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Never zero; empty uploads are rejected by [`Upload::new`].
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}
