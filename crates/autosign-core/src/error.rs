use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SignError {
    /// Signature configuration is missing, not base64, or empty.
    #[error("{0}")]
    ConfigDecode(String),

    #[error("Error loading signature image: {0}")]
    ImageDecode(String),

    #[error("Invalid signature image dimensions")]
    InvalidImage,

    #[error("Failed to parse PDF: {0}")]
    DocumentParse(String),

    #[error("'{0}' not found in the PDF.")]
    MarkerNotFound(String),

    #[error("Signature position would be outside page bounds")]
    OutOfBounds,

    #[error("Error inserting signature: {0}")]
    Compositing(String),
}
