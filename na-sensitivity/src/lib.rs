//! Variance based (Sobol) sensitivity analysis: Saltelli sampling of a
//! bounded parameter space and first-order / total effect indices.

extern crate ndarray as nd;
extern crate na_core as nac;
extern crate rand;
extern crate rayon;
#[macro_use]
extern crate log;

pub use analyze::{analyze, Indices};
pub use problem::Problem;
pub use sample::{evaluate, sample};

pub mod analyze;
pub mod problem;
pub mod sample;
