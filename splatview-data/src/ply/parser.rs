//! Data line parsing

use super::ParseError;
use super::header::read_header;
use crate::types::{Splat, SplatBatch};
use glam::Vec3;
use tracing::{debug, info, warn};

/// Color used when a line carries no r/g/b columns.
pub const DEFAULT_COLOR: Vec3 = Vec3::splat(0.7);

/// Isotropic scale used when a line carries no scale column.
pub const DEFAULT_SCALE: f32 = 0.01;

// Column layout: x y z | nx ny nz | r g b | scale
const MIN_COLUMNS: usize = 6;
const COLOR_COLUMNS: usize = 9;
const SCALE_COLUMNS: usize = 10;

// Avoid trusting a huge declared count for the up-front allocation.
const MAX_PREALLOCATED: usize = 1 << 20;

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport {
    pub batch: SplatBatch,
    /// Count declared by `element vertex <N>`.
    pub declared: usize,
    /// Data lines that were consumed but contributed no splat.
    pub skipped: usize,
}

/// Parse point-cloud text into a splat batch.
///
/// Exactly `N` lines after `end_header` are consumed. Lines with fewer than six
/// numeric columns are skipped without aborting the parse.
#[tracing::instrument(skip_all, fields(bytes = text.len()))]
pub fn parse_splats(text: &str) -> Result<ParseReport, ParseError> {
    let mut lines = text.lines();
    let header = read_header(&mut lines)?;
    let declared = header.vertex_count;

    let mut splats = Vec::with_capacity(declared.min(MAX_PREALLOCATED));
    let mut skipped = 0;
    let mut consumed = 0;

    for (index, line) in lines.take(declared).enumerate() {
        consumed += 1;
        match parse_line(line) {
            Some(splat) => splats.push(splat),
            None => {
                skipped += 1;
                debug!(line = index, "Skipping malformed data line");
            }
        }
    }

    if consumed < declared {
        warn!("Header declares {declared} vertices but only {consumed} data lines follow");
    }
    if skipped > 0 {
        warn!("Skipped {skipped} malformed data lines");
    }
    info!("Parsed {} splats", splats.len());

    Ok(ParseReport {
        batch: SplatBatch::new(splats),
        declared,
        skipped,
    })
}

/// Parse raw file bytes. Non-UTF-8 bytes are replaced, which only ever affects
/// lines that would be rejected as non-numeric anyway.
pub fn parse_splats_bytes(bytes: &[u8]) -> Result<ParseReport, ParseError> {
    parse_splats(&String::from_utf8_lossy(bytes))
}

/// Parse raw file bytes, turning a header failure into an empty batch.
pub fn parse_splats_lossy(bytes: &[u8]) -> SplatBatch {
    match parse_splats_bytes(bytes) {
        Ok(report) => report.batch,
        Err(err) => {
            warn!("{err}; loading an empty scene");
            SplatBatch::empty()
        }
    }
}

fn parse_line(line: &str) -> Option<Splat> {
    let mut columns = [0.0f32; SCALE_COLUMNS];
    let mut count = 0;

    for token in line.split_whitespace() {
        if count == columns.len() {
            break;
        }
        match token.parse::<f32>() {
            Ok(value) if value.is_finite() => {
                columns[count] = value;
                count += 1;
            }
            _ => break,
        }
    }

    if count < MIN_COLUMNS {
        return None;
    }

    let position = Vec3::new(columns[0], columns[1], columns[2]);
    let color = if count >= COLOR_COLUMNS {
        Vec3::new(columns[6], columns[7], columns[8]) / 255.0
    } else {
        DEFAULT_COLOR
    };
    let scale = if count >= SCALE_COLUMNS {
        columns[9]
    } else {
        DEFAULT_SCALE
    };

    Some(Splat::isotropic(position, color.extend(1.0), scale, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn file(count: usize, body: &[&str]) -> String {
        let mut text = format!(
            "ply\nformat ascii 1.0\nelement vertex {count}\nproperty float x\nend_header\n"
        );
        for line in body {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_two_splat_scene() {
        let text = file(
            2,
            &["0 0 0 0 0 0 255 0 0 0.02", "1 1 1 0 0 0 0 255 0 0.05"],
        );
        let report = parse_splats(&text).unwrap();
        let splats = report.batch.as_slice();
        assert_eq!(splats.len(), 2);

        assert_eq!(splats[0].position, Vec3::ZERO);
        assert_eq!(splats[0].color, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(splats[0].scale, Vec3::splat(0.02));
        assert_eq!(splats[0].opacity, 1.0);

        assert_eq!(splats[1].position, Vec3::ONE);
        assert_eq!(splats[1].color, Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(splats[1].scale, Vec3::splat(0.05));
    }

    #[test]
    fn test_declared_count_matches_well_formed_lines() {
        let body: Vec<String> = (0..50)
            .map(|i| format!("{i} {} 0.5 0 0 1 10 20 30 0.1", i * 2))
            .collect();
        let refs: Vec<&str> = body.iter().map(String::as_str).collect();
        let report = parse_splats(&file(50, &refs)).unwrap();
        assert_eq!(report.batch.len(), 50);
        assert_eq!(report.declared, 50);
        assert_eq!(report.skipped, 0);

        let last = report.batch.as_slice()[49];
        assert_eq!(last.position, Vec3::new(49.0, 98.0, 0.5));
        assert!((last.color.x - 10.0 / 255.0).abs() < 1e-6);
        assert!((last.color.z - 30.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_defaults_for_short_lines() {
        let report = parse_splats(&file(2, &["1 2 3 0 0 1", "1 2 3 0 0 1 255 255 255"])).unwrap();
        let splats = report.batch.as_slice();

        assert_eq!(splats[0].color, Vec4::new(0.7, 0.7, 0.7, 1.0));
        assert_eq!(splats[0].scale, Vec3::splat(DEFAULT_SCALE));

        assert_eq!(splats[1].color, Vec4::ONE);
        assert_eq!(splats[1].scale, Vec3::splat(DEFAULT_SCALE));
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let text = file(3, &["0 0 0 0 0 0", "1 2 three 0 0 0", "2 2 2 0 0 0"]);
        let report = parse_splats(&text).unwrap();
        assert_eq!(report.batch.len(), 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.batch.as_slice()[1].position, Vec3::splat(2.0));
    }

    #[test]
    fn test_short_line_consumes_a_slot() {
        // The declared count covers the malformed line, so the trailing line is not read.
        let text = file(2, &["0 0 0", "1 1 1 0 0 0", "2 2 2 0 0 0"]);
        let report = parse_splats(&text).unwrap();
        assert_eq!(report.batch.len(), 1);
        assert_eq!(report.batch.as_slice()[0].position, Vec3::ONE);
    }

    #[test]
    fn test_lines_beyond_declared_count_are_ignored() {
        let report = parse_splats(&file(1, &["0 0 0 0 0 0", "5 5 5 0 0 0"])).unwrap();
        assert_eq!(report.batch.len(), 1);
    }

    #[test]
    fn test_truncated_body() {
        let report = parse_splats(&file(4, &["0 0 0 0 0 0"])).unwrap();
        assert_eq!(report.batch.len(), 1);
        assert_eq!(report.declared, 4);
    }

    #[test]
    fn test_color_and_scale_are_clamped() {
        let report = parse_splats(&file(1, &["0 0 0 0 0 0 510 -10 128 -0.5"])).unwrap();
        let splat = report.batch.as_slice()[0];
        assert_eq!(splat.color.x, 1.0);
        assert_eq!(splat.color.y, 0.0);
        assert!((splat.color.z - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(splat.scale, Vec3::ZERO);
    }

    #[test]
    fn test_missing_end_header_yields_nothing() {
        let text = "ply\nelement vertex 1\n0 0 0 0 0 0\n";
        assert_eq!(parse_splats(text), Err(ParseError::MissingEndHeader));
        assert!(parse_splats_lossy(text.as_bytes()).is_empty());
    }

    #[test]
    fn test_missing_vertex_count_yields_nothing() {
        let text = "ply\nend_header\n0 0 0 0 0 0\n";
        assert_eq!(parse_splats(text), Err(ParseError::MissingVertexCount));
        assert!(parse_splats_lossy(text.as_bytes()).is_empty());
    }

    #[test]
    fn test_non_finite_tokens_end_the_numeric_prefix() {
        let report = parse_splats(&file(1, &["0 0 0 nan 0 0"])).unwrap();
        assert!(report.batch.is_empty());
    }

    #[test]
    fn test_invalid_utf8_bytes() {
        let mut bytes = file(2, &["0 0 0 0 0 0"]).into_bytes();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let report = parse_splats_bytes(&bytes).unwrap();
        assert_eq!(report.batch.len(), 1);
        assert_eq!(report.skipped, 1);
    }
}
