//! ASCII point-cloud parsing
//!
//! The accepted format is a fixed-order subset of ASCII PLY: a header that
//! declares `element vertex <N>` and ends with `end_header`, followed by `N`
//! whitespace-separated data lines read positionally. Property declarations
//! in the header are not consulted.

mod header;
mod parser;

pub use header::{END_HEADER, Header, read_header};
pub use parser::{
    DEFAULT_COLOR, DEFAULT_SCALE, ParseReport, parse_splats, parse_splats_bytes,
    parse_splats_lossy,
};

/// Reasons a file produces no splats at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no header / corrupt file: missing `end_header`")]
    MissingEndHeader,
    #[error("no header / corrupt file: missing `element vertex <N>`")]
    MissingVertexCount,
}
