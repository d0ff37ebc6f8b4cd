//! Response bodies

use autosign_core::SignatureInfo;
use serde::Serialize;

/// Multipart field carrying the uploaded PDF.
pub const PDF_FIELD: &str = "pdf";

/// Filename offered to the client for the signed PDF.
pub const SIGNED_FILENAME: &str = "signed_document.pdf";

#[derive(Debug, Clone, Serialize)]
pub struct TestSignatureResponse {
    pub status: &'static str,
    pub signature_info: SignatureInfo,
}

impl TestSignatureResponse {
    pub fn success(signature_info: SignatureInfo) -> Self {
        Self {
            status: "success",
            signature_info,
        }
    }
}
