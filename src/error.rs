use thiserror::Error;

/// Scanner-level conditions. `EndOfInput` is the normal terminal state of
/// every scan loop, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("end of input")]
    EndOfInput,

    #[error("token at offset {at} exceeds {limit} bytes")]
    TokenTooLong { at: usize, limit: usize },
}

/// Per-file failures. Structural damage below the file level is recorded as
/// an anomaly on the parsed document instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("input is {len} bytes, too short to hold a root heading")]
    InputTooShort { len: usize },

    #[error("no root heading found in {scanned} bytes")]
    NoRootSection { scanned: usize },

    #[error(transparent)]
    Scan(#[from] ScanError),
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;
