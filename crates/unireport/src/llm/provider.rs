//! Text generation provider trait and types.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Build usage only when all three counters are present.
    pub fn from_parts(prompt: Option<u64>, output: Option<u64>, total: Option<u64>) -> Option<Self> {
        Some(Self {
            prompt_tokens: prompt?,
            output_tokens: output?,
            total_tokens: total?,
        })
    }
}

/// One successful provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    /// Completion without usage metadata.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// A remote or local text generation backend.
///
/// Implementations must be thread-safe; concurrent pipeline runs share one
/// provider.
pub trait TextGenerator: Send + Sync {
    /// Generate text for a single prompt. One call is one attempt; retrying
    /// is the caller's concern.
    fn generate(&self, prompt: &str) -> Result<Completion>;

    /// Provider name for logs and metadata.
    fn name(&self) -> &str;
}
