//! Analysis digests and prompt construction.

mod digest;
mod prompts;

pub use digest::DigestFormatter;
pub use prompts::{FALLBACK_MARKER, PromptBuilder, ReportKind, fallback_report};
