
//! Recovers the Lorenz '63 coefficients from a window of observations of the
//! full state, first from exact observations and then from noisy ones.

extern crate ndarray as nd;
extern crate na_core as nac;
extern crate na_variational as na_var;
extern crate plot_helper;
extern crate rand;
extern crate sixty_three;
extern crate env_logger;
#[macro_use]
extern crate log;

use nd::{Array, Ix2};
use nac::{Packed, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use na_var::{Config, FourDVar};
use sixty_three::{estimate, L63Model, L63Estimate};

const STEPS: usize = 200;
const RNG_SEED: u64 = 1;
const NOISE_SD: f64 = 0.1;

fn run(model: &L63Model, background: &L63Estimate,
       observations: &Array<f64, Ix2>, what: &str,
       suffix: &str) -> Result<L63Estimate> {
  let dynamics = Packed(model);
  let analysis = FourDVar::with_config(&dynamics, Config::default())
    .analyse(background.to_array().view(), observations.view(), None, true)?;
  println!("{}: J = {:.6e} (Jb = {:.3e}, Jo = {:.3e}) after {} iterations",
           what, analysis.cost, analysis.background_cost,
           analysis.observation_cost, analysis.iterations);
  if !analysis.converged {
    warn!("{}: stopped at the iteration cap", what);
  }

  let fitted = L63Estimate::from_view(analysis.state.view())?;
  println!("{}: {:?}", what, fitted);

  let forecast = na_var::observe_series(model, &fitted, STEPS)?;
  let first_guess = na_var::observe_series(model, background, STEPS)?;
  plot_helper::make_fit_plots(what, suffix, &["x", "y", "z"],
                              observations.view(), forecast.view(),
                              Some(first_guess.view()))?;
  Ok(fitted)
}

fn main() -> Result<()> {
  env_logger::init();

  let model = L63Model::default();
  let truth = estimate(1.0, 1.0, 1.0, 28.0, 10.0, 2.667);
  let background = estimate(1.0, 1.0, 1.0, 20.0, 10.0, 5.0);
  println!("truth: {:?}", truth);
  println!("background: {:?}", background);

  let observations = na_var::observe_series(&model, &truth, STEPS)?;
  run(&model, &background, &observations, "exact observations", "exact")?;

  let mut rand = StdRng::seed_from_u64(RNG_SEED);
  let noisy = na_var::perturb_observations(observations.view(), NOISE_SD,
                                           &mut rand)?;
  run(&model, &background, &noisy, "noisy observations", "noisy")?;

  let states = na_var::trajectory(&Packed(&model), truth.to_array().view(),
                                  STEPS)?;
  plot_helper::make_3d_plot("Lorenz '63", "truth",
                            &[("truth", states.view())])?;
  Ok(())
}
