
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  #[error("{what}: expected length {expected}, got {got}")]
  ShapeMismatch {
    what: &'static str,
    expected: usize,
    got: usize,
  },

  #[error("no observations to assimilate")]
  EmptyObservations,

  /// Error variances weight the cost by their reciprocal.
  #[error("variance at index {index} must be finite and positive, got {value}")]
  InvalidVariance { index: usize, value: f64 },

  #[error("minimizer setup failed: {0}")]
  Solver(String),

  #[error("invalid bounds for parameter `{name}`")]
  InvalidBounds { name: String },

  #[error("model outputs have zero variance")]
  ZeroVariance,

  #[error(transparent)]
  Io(#[from] ::std::io::Error),

  #[error("line {line}: can't parse `{value}` as a number")]
  Parse { line: usize, value: String },

  #[error("requested {requested} values, only {available} available")]
  InsufficientData { requested: usize, available: usize },

  #[error("plotting failed: {0}")]
  Plot(String),
}

impl Error {
  pub fn shape(what: &'static str, expected: usize, got: usize) -> Error {
    Error::ShapeMismatch {
      what: what,
      expected: expected,
      got: got,
    }
  }
}
