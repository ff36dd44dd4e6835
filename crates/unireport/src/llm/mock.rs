//! Scripted text generator for testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{ReportError, Result};

use super::provider::{Completion, TextGenerator, TokenUsage};

/// Canned narrative returned once the script is exhausted.
const DEFAULT_NARRATIVE: &str = "# Laporan Analisis Data\n\n\
## Ringkasan\n\n\
Data yang dianalisis mencakup seluruh catatan yang tersedia dari sumber lokal maupun layanan data. \
Statistik deskriptif menunjukkan sebaran nilai yang wajar pada setiap kolom numerik.\n\n\
## Analisis Detail\n\n\
Kolom kategori didominasi oleh beberapa nilai utama.\n\n\
## Kesimpulan\n\n\
Kualitas data memadai untuk pelaporan rutin.\n";

/// Text generator that replays a script of responses and failures.
///
/// Each call pops the next scripted step. When the script is empty the
/// provider either returns a canned narrative or keeps failing, depending
/// on how it was built.
pub struct MockProvider {
    script: Mutex<VecDeque<std::result::Result<Completion, String>>>,
    fail_when_exhausted: bool,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Provider that always succeeds with a canned narrative.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fail_when_exhausted: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Provider that fails on every call.
    pub fn failing() -> Self {
        Self {
            fail_when_exhausted: true,
            ..Self::new()
        }
    }

    /// Queue a successful response.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.push(Ok(Completion::text(text)))
    }

    /// Queue a successful response carrying usage counters.
    pub fn with_usage_response(self, text: impl Into<String>, usage: TokenUsage) -> Self {
        self.push(Ok(Completion {
            text: text.into(),
            usage: Some(usage),
        }))
    }

    /// Queue a failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()))
    }

    fn push(self, step: std::result::Result<Completion, String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(step);
        }
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TextGenerator for MockProvider {
    fn generate(&self, prompt: &str) -> Result<Completion> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let step = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match step {
            Some(Ok(completion)) => Ok(completion),
            Some(Err(message)) => Err(ReportError::Generation(message)),
            None if self.fail_when_exhausted => {
                Err(ReportError::Generation("mock provider unavailable".to_string()))
            }
            None => Ok(Completion::text(DEFAULT_NARRATIVE)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_default() {
        let mock = MockProvider::new().with_failure("timeout").with_response("halo");

        assert!(mock.generate("p1").is_err());
        assert_eq!(mock.generate("p2").unwrap().text, "halo");
        assert!(mock.generate("p3").unwrap().text.len() >= 200);
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.prompts(), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_failing() {
        let mock = MockProvider::failing();
        assert!(mock.generate("a").is_err());
        assert!(mock.generate("b").is_err());
    }
}
