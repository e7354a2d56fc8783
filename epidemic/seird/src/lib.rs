
//! A discrete-time SEIRD epidemic: susceptible, exposed, infectious,
//! recovered and dead compartments advanced one day at a time, with the
//! cumulative death count as the only observation.

extern crate ndarray as nd;
extern crate na_core as nac;

use nd::prelude::*;
use nac::{Aggregate, Estimate, Model};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compartments {
  pub s: f64,
  pub e: f64,
  pub i: f64,
  pub r: f64,
  pub d: f64,
}
impl Compartments {
  /// Everyone not yet dead.
  pub fn alive(&self) -> f64 { self.s + self.e + self.i + self.r }
}
impl Aggregate for Compartments {
  const WIDTH: usize = 5;
  fn write_into(&self, mut out: ArrayViewMut<f64, Ix1>) {
    out[0] = self.s;
    out[1] = self.e;
    out[2] = self.i;
    out[3] = self.r;
    out[4] = self.d;
  }
  fn read_from(v: ArrayView<f64, Ix1>) -> Self {
    Compartments { s: v[0], e: v[1], i: v[2], r: v[3], d: v[4], }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
  /// Daily death probability of an infectious individual.
  pub alfa: f64,
  /// Transmission.
  pub beta: f64,
  /// Inverse incubation period.
  pub eps: f64,
  /// Recovery.
  pub gamma: f64,
}
impl Aggregate for Rates {
  const WIDTH: usize = 4;
  fn write_into(&self, mut out: ArrayViewMut<f64, Ix1>) {
    out[0] = self.alfa;
    out[1] = self.beta;
    out[2] = self.eps;
    out[3] = self.gamma;
  }
  fn read_from(v: ArrayView<f64, Ix1>) -> Self {
    Rates { alfa: v[0], beta: v[1], eps: v[2], gamma: v[3], }
  }
}

/// Flows between compartments are clamped to what the source compartment
/// holds, so no count goes negative whatever rates the estimator tries.
#[derive(Debug, Clone, Default)]
pub struct SeirdModel;

fn flow(v: f64, available: f64) -> f64 {
  v.min(available).max(0.0)
}

impl Model for SeirdModel {
  type State = Compartments;
  type Params = Rates;

  fn observation_dim(&self) -> usize { 1 }

  fn step(&self, c: &Compartments, p: &Rates) -> Compartments {
    let n = c.alive();
    let infections = if n > 0.0 {
      flow(c.s * p.beta * c.i / n, c.s)
    } else {
      0.0
    };
    let onsets = flow(p.eps * c.e, c.e);
    let deaths = flow(p.alfa * c.i, c.i);
    let recoveries = flow(p.gamma * c.i, c.i - deaths);

    Compartments {
      s: c.s - infections,
      e: c.e + infections - onsets,
      i: c.i + onsets - deaths - recoveries,
      r: c.r + recoveries,
      d: c.d + deaths,
    }
  }
  fn observe(&self, c: &Compartments, _: &Rates,
             mut out: ArrayViewMut<f64, Ix1>) {
    out[0] = c.d;
  }
}

pub type SeirdEstimate = Estimate<SeirdModel>;

pub fn estimate(c: [f64; 5], r: [f64; 4]) -> SeirdEstimate {
  Estimate::new(Compartments::read_from(aview1(&c[..])),
                Rates::read_from(aview1(&r[..])))
}

/// Forty million susceptibles and a single exposed case.
pub fn outbreak() -> SeirdEstimate {
  estimate([40.0e6, 1.0, 0.0, 0.0, 0.0], [0.007, 2.0, 0.2, 0.14])
}
