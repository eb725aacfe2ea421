use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::path::Path;

use crate::error::{AtomError, Result};

/// Encoded image bytes plus their MIME type
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageBlob {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Decode a base64 payload as returned by the generation service
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> Result<Self> {
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AtomError::invalid(format!("invalid base64 image data: {}", e)))?;
        Ok(Self::new(mime_type, data))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| AtomError::invalid("not a data URL"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AtomError::invalid("data URL has no payload"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| AtomError::invalid("data URL is not base64 encoded"))?;
        Self::from_base64(mime_type, payload)
    }

    /// Read an image file, guessing the MIME type from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| AtomError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mime_type = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            _ => "image/jpeg",
        };
        Ok(Self::new(mime_type, data))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }
}

impl fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBlob")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}
