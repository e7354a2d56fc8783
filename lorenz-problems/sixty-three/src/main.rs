
extern crate ndarray as nd;
extern crate na_core as nac;
extern crate na_sensitivity as na_sa;
extern crate na_variational as na_var;
extern crate plot_helper;
extern crate rand;
extern crate sixty_three;
extern crate env_logger;
#[macro_use]
extern crate log;

use nd::{ArrayView, Ix1};
use nac::{Aggregate, Packed, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use sixty_three::{estimate, L63Model, L63Params, L63Estimate};

const STEPS: usize = 2000;
const RNG_SEED: u64 = 1;
/// Base points of the Saltelli design.
const SAMPLES: usize = 1024;

/// Mean height of the attractor over the run.
fn mean_z(model: &L63Model, start: &L63Estimate) -> Result<f64> {
  let states = na_var::trajectory(&Packed(model), start.to_array().view(),
                                  STEPS)?;
  Ok(states.column(2).sum() / STEPS as f64)
}

fn main() -> Result<()> {
  env_logger::init();

  let model = L63Model::default();
  let p = L63Params::default();
  let truth = estimate(1.0, 1.0, 1.0, p.rho, p.sigma, p.beta);
  let states = na_var::trajectory(&Packed(&model), truth.to_array().view(),
                                  STEPS)?;
  plot_helper::make_3d_plot("Lorenz '63", "attractor",
                            &[("truth", states.view())])?;

  let problem = na_sa::Problem::new(vec![
    ("rho", 20.0..35.0),
    ("sigma", 8.0..12.0),
    ("beta", 2.0..3.0),
  ])?;
  let mut rand = StdRng::seed_from_u64(RNG_SEED);
  let samples = na_sa::sample(&problem, SAMPLES, &mut rand);
  info!("evaluating {} parameter combinations", samples.dim().0);

  let outputs = na_sa::evaluate(samples.view(), |row: ArrayView<f64, Ix1>| {
    let start = L63Estimate::new(truth.state, L63Params::read_from(row));
    mean_z(&model, &start).unwrap_or(::std::f64::NAN)
  });
  let indices = na_sa::analyze(&problem, outputs.view())?;
  for (i, name) in indices.names.iter().enumerate() {
    println!("{:>6}: S1 = {:.3}, ST = {:.3}", name,
             indices.first_order[i], indices.total[i]);
  }

  plot_helper::make_sensitivity_plot("mean z", "sensitivity",
                                     &indices.names,
                                     indices.first_order.view(),
                                     indices.total.view())?;
  Ok(())
}
