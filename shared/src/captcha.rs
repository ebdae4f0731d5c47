use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, ImageReader, Limits};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptchaError {
    #[error("not a data URL")]
    NotDataUrl,

    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),

    #[error("data URL is not base64-encoded")]
    NotBase64Encoded,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("image payload empty")]
    Empty,

    #[error("image payload too large: {size} bytes, max {max}")]
    TooLarge { size: usize, max: usize },

    #[error("unrecognised image data: {0}")]
    Undecodable(String),

    #[error("image dimensions {width}x{height} exceed {max}")]
    DimensionsTooLarge { width: u32, height: u32, max: u32 },
}

/// A decoded, size-checked CAPTCHA challenge ready to display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaImage {
    /// The `data:` URL as received, handed to the image element unchanged.
    pub src: String,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
}

impl CaptchaImage {
    /// Validates a `data:image/...;base64,...` URL from the CAPTCHA endpoint.
    pub fn from_data_url(
        src: &str,
        max_bytes: usize,
        max_dimension: u32,
    ) -> Result<Self, CaptchaError> {
        let rest = src.trim().strip_prefix("data:").ok_or(CaptchaError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(CaptchaError::NotDataUrl)?;

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default().to_ascii_lowercase();
        if !mime.starts_with("image/") {
            return Err(CaptchaError::UnsupportedMediaType(mime));
        }
        if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
            return Err(CaptchaError::NotBase64Encoded);
        }

        // Encoded size bounds the decoded size; reject before allocating.
        if payload.len() / 4 * 3 > max_bytes + 3 {
            return Err(CaptchaError::TooLarge {
                size: payload.len() / 4 * 3,
                max: max_bytes,
            });
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| CaptchaError::InvalidBase64(e.to_string()))?;
        if bytes.is_empty() {
            return Err(CaptchaError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(CaptchaError::TooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }

        let format = image::guess_format(&bytes)
            .map_err(|e| CaptchaError::Undecodable(e.to_string()))?;
        if !matches!(
            format,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP
        ) {
            return Err(CaptchaError::UnsupportedMediaType(format!("{format:?}")));
        }

        let mut limits = Limits::default();
        limits.max_image_width = Some(max_dimension);
        limits.max_image_height = Some(max_dimension);
        limits.max_alloc = Some(max_bytes as u64 * 64);

        let mut reader = ImageReader::with_format(Cursor::new(&bytes), format);
        reader.limits(limits);
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| CaptchaError::Undecodable(e.to_string()))?;
        if width > max_dimension || height > max_dimension {
            return Err(CaptchaError::DimensionsTooLarge {
                width,
                height,
                max: max_dimension,
            });
        }

        Ok(Self {
            src: src.trim().to_string(),
            mime,
            width,
            height,
            byte_len: bytes.len(),
        })
    }
}
