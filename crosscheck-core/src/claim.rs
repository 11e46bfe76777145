//! Claim value type and cache-key normalization
//!
//! A claim's normalized form is the identity used by the result cache and
//! the single-flight table: two textual variants of the same statement must
//! map to the same key.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use thiserror::Error;

use crate::MAX_CLAIM_CHARS;

/// Rejections at the claim boundary
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("claim text is empty")]
    Empty,

    #[error("claim text exceeds {0} characters")]
    TooLong(usize),
}

/// A user-submitted statement to be verified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    text: String,
    source_url: Option<String>,
}

impl Claim {
    /// Validate and construct a claim. Whitespace-only text is rejected.
    pub fn new(text: &str, source_url: Option<String>) -> Result<Self, ClaimError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ClaimError::Empty);
        }
        if trimmed.chars().count() > MAX_CLAIM_CHARS {
            return Err(ClaimError::TooLong(MAX_CLAIM_CHARS));
        }

        Ok(Self {
            text: trimmed.to_string(),
            source_url,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    /// Normalized form: lowercased, punctuation stripped, whitespace collapsed
    pub fn normalized(&self) -> String {
        let lowered: String = self
            .text
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        whitespace_re()
            .replace_all(lowered.trim(), " ")
            .into_owned()
    }

    /// Cache key: truncated SHA-256 hex digest of the normalized text
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.normalized().as_bytes());
        format!("{:x}", hasher.finalize())[..16].to_string()
    }
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}
