
extern crate ndarray as nd;
extern crate na_core as nac;

use nd::prelude::*;
use nac::{Aggregate, Estimate, Model};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L63State {
  pub x: f64,
  pub y: f64,
  pub z: f64,
}
impl Aggregate for L63State {
  const WIDTH: usize = 3;
  fn write_into(&self, mut out: ArrayViewMut<f64, Ix1>) {
    out[0] = self.x;
    out[1] = self.y;
    out[2] = self.z;
  }
  fn read_from(v: ArrayView<f64, Ix1>) -> Self {
    L63State { x: v[0], y: v[1], z: v[2], }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L63Params {
  pub rho: f64,
  pub sigma: f64,
  pub beta: f64,
}
impl Aggregate for L63Params {
  const WIDTH: usize = 3;
  fn write_into(&self, mut out: ArrayViewMut<f64, Ix1>) {
    out[0] = self.rho;
    out[1] = self.sigma;
    out[2] = self.beta;
  }
  fn read_from(v: ArrayView<f64, Ix1>) -> Self {
    L63Params { rho: v[0], sigma: v[1], beta: v[2], }
  }
}
impl Default for L63Params {
  fn default() -> Self {
    L63Params {
      rho: 28.0,
      sigma: 10.0,
      beta: 8.0 / 3.0,
    }
  }
}

/// Forward Euler discretization of Lorenz '63, observing every coordinate.
///
/// The coefficients are used by magnitude: an estimator is free to try
/// negative values, the model only ever sees positive ones.
#[derive(Debug, Clone)]
pub struct L63Model {
  pub dt: f64,
}
impl Default for L63Model {
  fn default() -> Self {
    L63Model {
      dt: 0.01,
    }
  }
}
impl Model for L63Model {
  type State = L63State;
  type Params = L63Params;

  fn observation_dim(&self) -> usize { 3 }

  fn step(&self, s: &L63State, p: &L63Params) -> L63State {
    let rho = p.rho.abs();
    let sigma = p.sigma.abs();
    let beta = p.beta.abs();

    L63State {
      x: s.x + self.dt * sigma * (s.y - s.x),
      y: s.y + self.dt * (s.x * (rho - s.z) - s.y),
      z: s.z + self.dt * (s.x * s.y - beta * s.z),
    }
  }
  fn observe(&self, s: &L63State, _: &L63Params,
             out: ArrayViewMut<f64, Ix1>) {
    s.write_into(out);
  }
}

pub type L63Estimate = Estimate<L63Model>;

pub fn estimate(x: f64, y: f64, z: f64,
                rho: f64, sigma: f64, beta: f64) -> L63Estimate {
  Estimate::new(L63State { x: x, y: y, z: z, },
                L63Params { rho: rho, sigma: sigma, beta: beta, })
}

#[cfg(test)]
mod test {
  extern crate na_variational as na_var;

  use super::*;
  use nac::{Dynamics, Packed};

  #[test]
  fn params_carried() {
    let m = L63Model::default();
    let e = estimate(1.0, 1.0, 1.0, 28.0, 10.0, 8.0 / 3.0);
    let next = e.step(&m);
    assert_eq!(next.params, e.params);

    assert_eq!(next.state.x, 1.0);
    assert!((next.state.y - 1.26).abs() < 1e-12, "{:?}", next.state);
    assert!((next.state.z - (1.0 + 0.01 * (1.0 - 8.0 / 3.0))).abs() < 1e-12,
            "{:?}", next.state);
  }

  #[test]
  fn increments() {
    let m = L63Model { dt: 0.001, };
    let e = estimate(-3.0, 2.0, 20.0, 28.0, 10.0, 2.5);
    let next = e.step(&m);
    assert!((next.state.x - (-3.0 + 0.001 * 10.0 * 5.0)).abs() < 1e-12);
    assert!((next.state.y - (2.0 + 0.001 * (-3.0 * 8.0 - 2.0))).abs() < 1e-12);
    assert!((next.state.z - (20.0 + 0.001 * (-6.0 - 50.0))).abs() < 1e-12);
  }

  #[test]
  fn negative_coefficients() {
    let m = L63Model::default();
    let pos = estimate(1.0, 2.0, 3.0, 28.0, 10.0, 2.0).step(&m);
    let neg = estimate(1.0, 2.0, 3.0, -28.0, -10.0, -2.0).step(&m);
    assert_eq!(pos.state, neg.state);
    assert_eq!(neg.params.rho, -28.0);
  }

  #[test]
  fn observe_coordinates() {
    let d = Packed(&L63Model::default());
    let obs = d.observation(estimate(1.0, 2.0, 3.0, 28.0, 10.0, 2.0)
                              .to_array().view());
    assert_eq!(obs, arr1(&[1.0, 2.0, 3.0]));
  }

  #[test]
  fn observations_reproducible() {
    let m = L63Model::default();
    let e = estimate(1.0, 1.0, 1.0, 28.0, 10.0, 8.0 / 3.0);
    let a = na_var::observe_series(&m, &e, 200).unwrap();
    let b = na_var::observe_series(&m, &e, 200).unwrap();
    assert_eq!(a.dim(), (200, 3));
    assert_eq!(a, b);
  }

  #[test]
  fn background_is_truth() {
    let m = L63Model::default();
    let truth = estimate(1.0, 1.0, 1.0, 28.0, 10.0, 2.667);
    let y = na_var::observe_series(&m, &truth, 200).unwrap();

    let a = na_var::assimilate_model(&m, &truth, y.view(), None, false)
      .expect("assimilation failed");
    assert_eq!(a.to_array(), truth.to_array());
  }

  #[test]
  fn recovers_parameters() {
    let m = L63Model::default();
    let truth = estimate(1.0, 1.0, 1.0, 28.0, 10.0, 2.667);
    let y = na_var::observe_series(&m, &truth, 200).unwrap();
    let background = estimate(1.0, 1.0, 1.0, 20.0, 10.0, 5.0);

    let a = na_var::FourDVar::new(&Packed(&m))
      .analyse(background.to_array().view(), y.view(), None, false)
      .expect("assimilation failed");
    let e = L63Estimate::from_view(a.state.view()).unwrap();

    // the model only sees magnitudes, so the sign of a coefficient is free
    assert!((e.params.rho.abs() - 28.0).abs() < 0.05, "{:?}", e);
    assert!((e.params.sigma.abs() - 10.0).abs() < 0.05, "{:?}", e);
    assert!((e.params.beta.abs() - 2.667).abs() < 0.05, "{:?}", e);
    assert!((e.state.x - 1.0).abs() < 0.05, "{:?}", e);
    assert!(a.observation_cost < 1.0, "{:?}", a);
  }
}
