//! Header scanning

use super::ParseError;
use tracing::warn;

/// Literal line that terminates the header region.
pub const END_HEADER: &str = "end_header";

/// Facts read from the header region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Declared splat count from `element vertex <N>`.
    pub vertex_count: usize,
    /// Value of the `format` line, if one was present.
    pub format: Option<String>,
}

/// Consume lines up to and including `end_header`.
///
/// On success the iterator is left positioned on the first data line.
pub fn read_header<'a, I>(lines: &mut I) -> Result<Header, ParseError>
where
    I: Iterator<Item = &'a str>,
{
    let mut vertex_count = None;
    let mut format = None;

    for line in lines.by_ref() {
        let line = line.trim();
        if line == END_HEADER {
            let vertex_count = vertex_count.ok_or(ParseError::MissingVertexCount)?;
            return Ok(Header {
                vertex_count,
                format,
            });
        }

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("element") if vertex_count.is_none() => {
                if tokens.next() == Some("vertex") {
                    vertex_count = tokens.next().and_then(|n| n.parse().ok());
                }
            }
            Some("format") => {
                let value = tokens.next().unwrap_or_default().to_string();
                if value != "ascii" {
                    warn!("Header declares format {value:?}; data lines are read as ASCII");
                }
                format = Some(value);
            }
            _ => {}
        }
    }

    Err(ParseError::MissingEndHeader)
}
