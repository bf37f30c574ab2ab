use crate::PipelineError;

/// Uploads above this size are accepted but will be scaled down before slicing.
pub const MAX_UPLOAD_BYTES: u64 = 6 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadNotice {
    Accepted,
    WillResize,
}

impl UploadNotice {
    pub fn message(self) -> &'static str {
        match self {
            UploadNotice::Accepted => "image loaded; it will be stretched to fit the grid",
            UploadNotice::WillResize => "image is large; it will be resized before slicing",
        }
    }
}

pub fn validate_upload(mime: &str, size_bytes: u64) -> Result<UploadNotice, PipelineError> {
    if !mime.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(PipelineError::UnsupportedUpload(mime.to_string()));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        Ok(UploadNotice::WillResize)
    } else {
        Ok(UploadNotice::Accepted)
    }
}

/// Media type guessed from magic bytes, for sources that arrive without one.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}
