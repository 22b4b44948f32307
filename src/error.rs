use std::error::Error;

/// Errors that abort the rendering of a single record.
///
/// All variants are surfaced to the caller of the renderer; the record in
/// question produces no output and the caller decides whether to drop it or
/// substitute a fallback rendering.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// A placeholder name could not be matched against any attribute, by
    /// occurrence index or by key.
    #[error("no attribute for placeholder {index} (`{name}`)")]
    Unresolved { index: usize, name: String },

    /// A dotted-path placeholder stepped into a non-group value or named an
    /// absent group member.
    #[error("path `{path}` at placeholder {index} does not traverse groups")]
    Traversal { index: usize, path: String },

    /// An opaque value's text-marshaling capability failed.
    #[error("marshaling attribute value failed: {0}")]
    Marshal(#[source] Box<dyn Error + Send + Sync>),
}

/// Hard defects of the timestamp parser.
///
/// Only genuinely malformed mandatory numeric sub-fields raise these; every
/// optional or malformed-but-recoverable field degrades silently to values
/// taken from the reference timestamp.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StampError {
    #[error("invalid digit {0:?}")]
    Digit(char),

    #[error("unknown month token {0:?}")]
    Month(String),
}
