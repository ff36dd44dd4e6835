//! Text generation providers and the retrying generation client.
//!
//! # Supported Providers
//!
//! - **Gemini** - Google Gemini models via API (requires `GEMINI_API_KEY`)
//! - **Mock** - scripted responses for tests and offline runs

mod client;
mod gemini;
mod mock;
mod provider;

pub use client::{GenerationClient, GenerationResult, RecordingSleeper, Sleeper, ThreadSleeper};
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use provider::{Completion, TextGenerator, TokenUsage};
