//! Process configuration, read once at startup.

use std::str::FromStr;

use autosign_core::{SignerOptions, SizingMode, DEFAULT_MARGIN};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct Config {
    /// Base64 signature image. Validated per request, not at startup.
    pub signature_base64: Option<String>,
    pub port: u16,
    pub margin: f64,
    pub sizing: SizingMode,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            signature_base64: None,
            port: DEFAULT_PORT,
            margin: DEFAULT_MARGIN,
            sizing: SizingMode::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

// The signature can be tens of kilobytes of base64; keep it out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "signature_base64",
                &self.signature_base64.as_ref().map(|s| format!("<{} chars>", s.len())),
            )
            .field("port", &self.port)
            .field("margin", &self.margin)
            .field("sizing", &self.sizing)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Bad values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let margin = parse_or(&lookup, "SIGNATURE_MARGIN", defaults.margin);
        let margin = if margin.is_finite() && margin >= 0.0 {
            margin
        } else {
            tracing::warn!("Ignoring SIGNATURE_MARGIN={}, using {}", margin, defaults.margin);
            defaults.margin
        };

        let sizing = match lookup("SIGNATURE_SIZING").map(|s| s.trim().to_ascii_lowercase()) {
            None => defaults.sizing,
            Some(mode) if mode.is_empty() || mode == "native" => SizingMode::default(),
            Some(mode) if mode == "fixed" => SizingMode::fixed(),
            Some(mode) => {
                tracing::warn!("Unknown SIGNATURE_SIZING '{}', using native", mode);
                defaults.sizing
            }
        };

        Self {
            signature_base64: lookup("SIGNATURE_BASE64"),
            port: parse_or(&lookup, "PORT", defaults.port),
            margin,
            sizing,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }

    pub fn signer_options(&self) -> SignerOptions {
        SignerOptions {
            margin: self.margin,
            sizing: self.sizing,
            ..SignerOptions::default()
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring {}='{}', using {}", key, raw, default);
            default
        }),
    }
}
