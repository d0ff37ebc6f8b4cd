//! Decoding the configured signature image.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;

use crate::error::SignError;

/// Standard alphabet; trailing `=` padding optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded raster signature together with the bytes it came from.
#[derive(Debug, Clone)]
pub struct SignatureImage {
    bytes: Vec<u8>,
    format: Option<ImageFormat>,
    image: DynamicImage,
}

/// Dimensions and size of the configured signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignatureInfo {
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

impl SignatureImage {
    /// Decode an encoded raster (PNG, JPEG).
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SignError> {
        let format = image::guess_format(&bytes).ok();
        let image = image::load_from_memory(&bytes)
            .map_err(|e| SignError::ImageDecode(e.to_string()))?;
        Ok(Self {
            bytes,
            format,
            image,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Size of the encoded image, not of the base64 text.
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn info(&self) -> SignatureInfo {
        SignatureInfo {
            width: self.width(),
            height: self.height(),
            size_bytes: self.size_bytes(),
        }
    }
}

/// Decode the base64 configuration value into raw image bytes.
///
/// Whitespace (including line breaks from wrapped `.env` values) is ignored.
pub fn decode_signature_config(encoded: Option<&str>) -> Result<Vec<u8>, SignError> {
    let encoded = encoded
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SignError::ConfigDecode("Signature environment variable not found".into()))?;

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = LENIENT
        .decode(compact.as_bytes())
        .map_err(|_| SignError::ConfigDecode("Invalid base64 signature data".into()))?;

    if bytes.is_empty() {
        return Err(SignError::ConfigDecode("Empty signature data".into()));
    }
    Ok(bytes)
}

/// Decode the configured signature into an image.
pub fn load_signature_image(encoded: Option<&str>) -> Result<SignatureImage, SignError> {
    let bytes = decode_signature_config(encoded)?;
    let signature = SignatureImage::from_bytes(bytes)?;
    tracing::debug!(
        "Loaded signature {}x{} ({} bytes, {:?})",
        signature.width(),
        signature.height(),
        signature.size_bytes(),
        signature.format()
    );
    Ok(signature)
}

/// Report the configured signature's dimensions without touching a document.
pub fn describe_signature(encoded: Option<&str>) -> Result<SignatureInfo, SignError> {
    load_signature_image(encoded).map(|s| s.info())
}
