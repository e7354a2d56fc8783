
extern crate ndarray as nd;
extern crate na_core as nac;
extern crate na_sensitivity as na_sa;
extern crate na_variational as na_var;
extern crate plot_helper;
extern crate rand;
extern crate seird;
extern crate util;
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;

use clap::Parser;
use nd::{ArrayView, Ix1};
use nac::{Aggregate, Packed, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use na_var::{Config, FourDVar};
use seird::{estimate, outbreak, Rates, SeirdEstimate, SeirdModel};

use std::path::{Path, PathBuf};

const DAYS: usize = 200;
const RNG_SEED: u64 = 1;
const SAMPLES: usize = 512;
/// Days of recorded deaths to calibrate on.
const CALIBRATION_DAYS: usize = 100;

/// SEIRD outbreak: Sobol sensitivity of the death toll to the rates, then,
/// given recorded deaths, calibration of the model to them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// CSV of cumulative deaths, one row per country and day
  #[arg(short, long)]
  data: Option<PathBuf>,

  /// Country code to calibrate on
  #[arg(short, long, default_value = "POL")]
  country: String,

  /// Only write the figures to `graphs/`
  #[arg(long)]
  no_gui: bool,
}

fn scenario() -> Result<()> {
  let truth = outbreak();
  let deaths = na_var::observe_series(&SeirdModel, &truth, DAYS)?;
  println!("deaths after {} days: {:.0}", DAYS, deaths[[DAYS - 1, 0]]);

  let problem = na_sa::Problem::new(vec![
    ("alfa", 0.001..0.02),
    ("beta", 0.1..2.5),
    ("eps", 0.1..0.5),
    ("gamma", 0.05..0.5),
  ])?;
  let mut rand = StdRng::seed_from_u64(RNG_SEED);
  let samples = na_sa::sample(&problem, SAMPLES, &mut rand);
  info!("evaluating {} rate combinations", samples.dim().0);

  let dynamics = Packed(&SeirdModel);
  let outputs = na_sa::evaluate(samples.view(), |row: ArrayView<f64, Ix1>| {
    let start = SeirdEstimate::new(truth.state, Rates::read_from(row));
    na_var::generate_observations(&dynamics, start.to_array().view(), DAYS)
      .map(|y| y[[DAYS - 1, 0]] )
      .unwrap_or(::std::f64::NAN)
  });
  let indices = na_sa::analyze(&problem, outputs.view())?;
  for (i, name) in indices.names.iter().enumerate() {
    println!("{:>6}: S1 = {:.3}, ST = {:.3}", name,
             indices.first_order[i], indices.total[i]);
  }

  plot_helper::make_sensitivity_plot("deaths", "sensitivity",
                                     &indices.names,
                                     indices.first_order.view(),
                                     indices.total.view())
}

fn calibrate(path: &Path, country: &str) -> Result<()> {
  let observations = util::data::load_cumulative_deaths(path, country,
                                                        CALIBRATION_DAYS)?;

  let background = estimate([39.9e6, 10000.0, 10000.0, 80000.0, 2300.0],
                            [0.006, 0.45, 0.125, 0.33]);
  let config = Config {
    background_variance: 1.0e6,
    observation_variance: 1.0,
    .. Default::default()
  };
  let dynamics = Packed(&SeirdModel);
  let analysis = FourDVar::with_config(&dynamics, config)
    .analyse(background.to_array().view(), observations.view(), None, true)?;
  println!("J = {:.6e} (Jb = {:.3e}, Jo = {:.3e})", analysis.cost,
           analysis.background_cost, analysis.observation_cost);

  let fitted = SeirdEstimate::from_view(analysis.state.view())?;
  println!("{:?}", fitted);
  for (what, e) in [("background", &background), ("analysis", &fitted)] {
    let misfit = na_var::cumulative_misfit(&dynamics, e.to_array().view(),
                                           observations.view())?;
    println!("{} misfit: {:.1}", what, misfit);
  }

  let forecast = na_var::observe_series(&SeirdModel, &fitted,
                                        CALIBRATION_DAYS)?;
  let first_guess = na_var::observe_series(&SeirdModel, &background,
                                           CALIBRATION_DAYS)?;
  let what = format!("cumulative deaths, {}", country);
  plot_helper::make_fit_plots(&what, "calibration", &["deaths"],
                              observations.view(), forecast.view(),
                              Some(first_guess.view()))
}

fn main() -> Result<()> {
  env_logger::init();
  let args = Args::parse();
  if args.no_gui {
    info!("figures go to {}", plot_helper::out_dir()?.display());
  }

  scenario()?;

  if let Some(ref path) = args.data {
    calibrate(path, &args.country)?;
  }
  Ok(())
}

#[cfg(test)]
mod test {
  use super::*;
  use clap::Parser;

  #[test]
  fn args_default() {
    let args = Args::try_parse_from(vec!["seird"]).unwrap();
    assert_eq!(args.data, None);
    assert_eq!(args.country, "POL");
    assert!(!args.no_gui);
  }

  #[test]
  fn args_calibration() {
    let args = Args::try_parse_from(vec!["seird", "--data", "deaths.csv",
                                         "-c", "ITA", "--no-gui"])
      .unwrap();
    assert_eq!(args.data, Some(PathBuf::from("deaths.csv")));
    assert_eq!(args.country, "ITA");
    assert!(args.no_gui);
  }

  #[test]
  fn args_rejected() {
    assert!(Args::try_parse_from(vec!["seird", "--data"]).is_err());
    assert!(Args::try_parse_from(vec!["seird", "--days", "3"]).is_err());
  }
}
