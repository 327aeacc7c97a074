// Error types for mesh decoding and graph construction
//
// FormatError is fatal to a build and surfaces to the caller. GeometryError
// never escapes the builder: the affected door or corner is skipped and the
// error is logged. Search exhaustion is not an error at all; searches return
// `None`.

use thiserror::Error;

/// Unparseable or unsupported mesh input
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("bad magic number {found:#010x} (expected {expected:#010x})")]
    BadMagic { found: u32, expected: u32 },
    #[error("unsupported mesh version {version} (supported {min}..={max})")]
    UnsupportedVersion { version: u32, min: u32, max: u32 },
    #[error("mesh contains no areas")]
    NoAreas,
    #[error("{what} count {count} exceeds limit {limit}")]
    Oversized {
        what: &'static str,
        count: usize,
        limit: usize,
    },
    #[error("duplicate area id {0}")]
    DuplicateArea(u32),
    #[error("truncated mesh data: {0}")]
    Truncated(#[from] std::io::Error),
}

/// A door or wall-corner computation that degenerated
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("areas {a} and {b} have no facing edge data")]
    NoFacingEdge { a: u32, b: u32 },
    #[error("facing edges of areas {a} and {b} do not overlap (width {width})")]
    ZeroOverlap { a: u32, b: u32, width: f32 },
    #[error("area {0} has a degenerate footprint")]
    DegenerateArea(u32),
}

/// Top-level error for building a navigation graph
#[derive(Debug, Error)]
pub enum NavError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("could not read mesh file: {0}")]
    Io(std::io::Error),
}
