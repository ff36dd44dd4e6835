//! Bounded-retry generation with a deterministic fallback.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::AnalysisResult;
use crate::report::{DigestFormatter, fallback_report};

use super::provider::{TextGenerator, TokenUsage};

/// Pause between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] that blocks the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// [`Sleeper`] that records requested delays without waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

/// Narrative produced for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    /// Present only when the provider reported all three counters.
    pub usage: Option<TokenUsage>,
    pub is_fallback: bool,
    /// Provider calls made.
    pub attempts: u32,
}

/// Calls a [`TextGenerator`] with exponential backoff and falls back to a
/// templated narrative when every attempt fails.
pub struct GenerationClient {
    provider: Arc<dyn TextGenerator>,
    formatter: Arc<DigestFormatter>,
    max_attempts: u32,
    base_delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl GenerationClient {
    /// Create a client with three attempts and one-second backoff units.
    pub fn new(provider: Arc<dyn TextGenerator>, formatter: Arc<DigestFormatter>) -> Self {
        Self {
            provider,
            formatter,
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Set the maximum number of provider calls (at least one).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the backoff unit.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Replace the sleeper used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Generate a narrative for `prompt`.
    ///
    /// After a failed attempt `n` (0-based) that is not the last, waits
    /// `2^n` backoff units. Never fails: when attempts are exhausted the
    /// result is the fallback narrative built from `analysis`.
    pub fn generate(&self, prompt: &str, analysis: &AnalysisResult) -> GenerationResult {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            match self.provider.generate(prompt) {
                Ok(completion) => {
                    info!(
                        "Generated {} characters with {} (attempt {})",
                        completion.text.chars().count(),
                        self.provider.name(),
                        attempt + 1
                    );
                    return GenerationResult {
                        text: completion.text,
                        usage: completion.usage,
                        is_fallback: false,
                        attempts: attempt + 1,
                    };
                }
                Err(e) => {
                    if attempt + 1 < self.max_attempts {
                        let delay = self.base_delay * 2u32.saturating_pow(attempt);
                        warn!(
                            "Generation attempt {} failed: {}. Retrying in {:?}",
                            attempt + 1,
                            e,
                            delay
                        );
                        self.sleeper.sleep(delay);
                    } else {
                        warn!("Generation attempt {} failed: {}", attempt + 1, e);
                    }
                    last_error = Some(e);
                }
            }
        }

        warn!(
            "Generation failed after {} attempts, using fallback report: {}",
            self.max_attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        );
        GenerationResult {
            text: fallback_report(&self.formatter.format(analysis)),
            usage: None,
            is_fallback: true,
            attempts: self.max_attempts,
        }
    }
}
