//! Errors surfaced by sketch construction, combination and decoding.

/// Sketch error
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    /// Out-of-range precision or retained bits, or a malformed bias table.
    #[error("invalid parameters: {0}")]
    Validation(String),
    /// A combiner was called without any sketch.
    #[error("input sketches cannot be empty")]
    EmptyInput,
    /// Combiner operands (or a sketch and a bias table) disagree on `p` or `r`.
    #[error("incompatible parameters: expected (p = {expected_p}, r = {expected_r}), found (p = {found_p}, r = {found_r})")]
    IncompatibleParameters {
        expected_p: u32,
        expected_r: u32,
        found_p: u32,
        found_r: u32,
    },
    /// Bytes do not hold a sketch this crate knows how to decode.
    #[error("malformed serialized sketch: {0}")]
    SerializationFormat(String),
}

pub type Result<T> = std::result::Result<T, SketchError>;
