//! Variational data assimilation over small discrete-time models.

extern crate ndarray as nd;
extern crate na_core as nac;
extern crate argmin;
extern crate rand;
extern crate rand_distr;
extern crate util;
#[macro_use]
extern crate log;

pub use fourd_var::{assimilate, assimilate_fns, assimilate_model,
                    Analysis, Config, FourDVar};
pub use observations::{cumulative_misfit, generate_observations,
                       observe_series, perturb_observations, trajectory};

pub mod fourd_var;
pub mod observations;
