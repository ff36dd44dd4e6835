//! Heuristic quality checks for generated narratives.

mod checks;
mod result;

pub use checks::{
    HedgingCheck, LengthCheck, NumericClaimCheck, ReportCheck, ReportValidator, UnknownEntityCheck,
};
pub use result::ValidationResult;
