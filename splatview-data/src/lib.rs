//! Splatview Data Crate
//!
//! Splat types and point-cloud parsing. This crate is GPU-agnostic: it turns
//! the text of a geometry file into an immutable [`SplatBatch`] that the GPU
//! crate packs into a vertex buffer.

pub mod ply;
pub mod types;

pub use ply::{ParseError, ParseReport, parse_splats, parse_splats_bytes, parse_splats_lossy};
pub use types::{SceneBounds, Splat, SplatBatch};
