//! Source resolution, parsing and multi-source ingestion.

mod fetch;
mod ingest;
mod locator;
mod parser;
mod source;

pub use fetch::{HttpFetcher, ListingEntry, RemoteFetcher, parse_listing};
pub use ingest::{
    IngestOutput, IngestReport, Ingester, SOURCE_FILE_COLUMN, SOURCE_TYPE_COLUMN, SkipReason,
    SourceOutcome, write_table,
};
pub use locator::{LocatorKind, SourceLocator, SourceResolver};
pub use parser::{Parser, ParserConfig};
pub use source::{Cell, ColumnKind, DataTable, SourceMetadata};
