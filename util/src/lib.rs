extern crate ndarray as nd;
extern crate na_core as nac;
extern crate pbr;
#[macro_use]
extern crate log;

pub mod data;
pub mod progress;
