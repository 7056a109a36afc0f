use core::fmt;

/// Result alias for `carto`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the clustering and projection pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Index outside `[0, count)`.
    InvalidIndex {
        /// Offending index.
        index: usize,
        /// Number of elements.
        count: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// The least-squares system could not be factorized.
    ///
    /// The normal-equation matrix is positive definite for every connected
    /// neighbor mesh, so a failure here means the mesh was degenerate.
    /// Callers should retry with a larger neighbor count or fall back to
    /// returning clusters without coordinates.
    NumericalFailure {
        /// Stage that failed.
        stage: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::InvalidIndex { index, count } => {
                write!(f, "index {index} out of bounds for {count} elements")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::NumericalFailure { stage } => {
                write!(f, "numerical failure during {stage}")
            }
        }
    }
}

impl std::error::Error for Error {}
