
extern crate ndarray as nd;
extern crate thiserror;

use nd::prelude::*;

use std::ops::Index;

pub use error::{Result, Error};

pub mod error;

/// A fixed-width group of scalars that can be packed into (and read back
/// from) a flat estimation vector.
pub trait Aggregate: Clone + Sized {
  const WIDTH: usize;

  fn write_into(&self, out: ArrayViewMut<f64, Ix1>);
  /// `v` is exactly `WIDTH` long.
  fn read_from(v: ArrayView<f64, Ix1>) -> Self;

  fn to_array(&self) -> Array<f64, Ix1> {
    let mut out = Array::zeros(Self::WIDTH);
    self.write_into(out.view_mut());
    out
  }
  fn from_view(v: ArrayView<f64, Ix1>) -> Result<Self> {
    if v.len() != Self::WIDTH {
      return Err(Error::shape("aggregate", Self::WIDTH, v.len()));
    }
    Ok(Self::read_from(v))
  }
}

/// A discrete-time model whose dynamic state evolves under a set of static
/// parameters.
pub trait Model: Send + Sync {
  type State: Aggregate;
  type Params: Aggregate;

  fn observation_dim(&self) -> usize;

  /// Advance one time unit. `params` must come out of the step unchanged,
  /// so they're not part of the result.
  fn step(&self, state: &Self::State, params: &Self::Params) -> Self::State;
  fn observe(&self, state: &Self::State, params: &Self::Params,
             out: ArrayViewMut<f64, Ix1>);
}

/// The quantity the assimilation estimates: the initial dynamic state plus
/// the model parameters. Flat layout is `[state.., params..]`.
pub struct Estimate<M>
  where M: Model + ?Sized,
{
  pub state: M::State,
  pub params: M::Params,
}
impl<M> ::std::fmt::Debug for Estimate<M>
  where M: Model + ?Sized,
        M::State: ::std::fmt::Debug,
        M::Params: ::std::fmt::Debug,
{
  fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
    f.debug_struct("Estimate")
      .field("state", &self.state)
      .field("params", &self.params)
      .finish()
  }
}
impl<M> Clone for Estimate<M>
  where M: Model + ?Sized,
{
  fn clone(&self) -> Self {
    Estimate {
      state: self.state.clone(),
      params: self.params.clone(),
    }
  }
}
impl<M> Estimate<M>
  where M: Model + ?Sized,
{
  pub fn new(state: M::State, params: M::Params) -> Estimate<M> {
    Estimate {
      state: state,
      params: params,
    }
  }

  pub fn width() -> usize {
    <M::State as Aggregate>::WIDTH + <M::Params as Aggregate>::WIDTH
  }

  pub fn to_array(&self) -> Array<f64, Ix1> {
    let mut out = Array::zeros(Self::width());
    {
      let (s, p) = out.view_mut()
        .split_at(Axis(0), <M::State as Aggregate>::WIDTH);
      self.state.write_into(s);
      self.params.write_into(p);
    }
    out
  }
  pub fn from_view(v: ArrayView<f64, Ix1>) -> Result<Estimate<M>> {
    if v.len() != Self::width() {
      return Err(Error::shape("estimate", Self::width(), v.len()));
    }

    let (s, p) = v.split_at(Axis(0), <M::State as Aggregate>::WIDTH);
    Ok(Estimate {
      state: Aggregate::read_from(s),
      params: Aggregate::read_from(p),
    })
  }

  pub fn step(&self, model: &M) -> Estimate<M> {
    Estimate {
      state: model.step(&self.state, &self.params),
      params: self.params.clone(),
    }
  }
}

/// The flat view of a model the assimilation engine works on: a transition
/// function and an observation operator over plain vectors.
pub trait Dynamics {
  fn state_dim(&self) -> usize;
  fn observation_dim(&self) -> usize;
  fn transition(&self, x: ArrayView<f64, Ix1>) -> Array<f64, Ix1>;
  fn observation(&self, x: ArrayView<f64, Ix1>) -> Array<f64, Ix1>;
}

/// Presents a typed `Model` as `Dynamics` over its packed `Estimate`.
#[derive(Debug)]
pub struct Packed<'a, M>(pub &'a M)
  where M: Model + 'a;
impl<'a, M> Packed<'a, M>
  where M: Model,
{
  fn unpack(&self, x: ArrayView<f64, Ix1>) -> Estimate<M> {
    let (s, p) = x.split_at(Axis(0), <M::State as Aggregate>::WIDTH);
    Estimate::new(Aggregate::read_from(s), Aggregate::read_from(p))
  }
}
impl<'a, M> Dynamics for Packed<'a, M>
  where M: Model,
{
  fn state_dim(&self) -> usize { Estimate::<M>::width() }
  fn observation_dim(&self) -> usize { self.0.observation_dim() }
  fn transition(&self, x: ArrayView<f64, Ix1>) -> Array<f64, Ix1> {
    debug_assert_eq!(x.len(), self.state_dim());
    self.unpack(x).step(self.0).to_array()
  }
  fn observation(&self, x: ArrayView<f64, Ix1>) -> Array<f64, Ix1> {
    debug_assert_eq!(x.len(), self.state_dim());
    let e = self.unpack(x);
    let mut out = Array::zeros(self.0.observation_dim());
    self.0.observe(&e.state, &e.params, out.view_mut());
    out
  }
}

/// `Dynamics` from a pair of plain functions.
pub struct FnDynamics<T, O>
  where T: Fn(ArrayView<f64, Ix1>) -> Array<f64, Ix1>,
        O: Fn(ArrayView<f64, Ix1>) -> Array<f64, Ix1>,
{
  pub state_dim: usize,
  pub observation_dim: usize,
  pub transition: T,
  pub observation: O,
}
impl<T, O> Dynamics for FnDynamics<T, O>
  where T: Fn(ArrayView<f64, Ix1>) -> Array<f64, Ix1>,
        O: Fn(ArrayView<f64, Ix1>) -> Array<f64, Ix1>,
{
  fn state_dim(&self) -> usize { self.state_dim }
  fn observation_dim(&self) -> usize { self.observation_dim }
  fn transition(&self, x: ArrayView<f64, Ix1>) -> Array<f64, Ix1> {
    (self.transition)(x)
  }
  fn observation(&self, x: ArrayView<f64, Ix1>) -> Array<f64, Ix1> {
    (self.observation)(x)
  }
}

/// A diagonal covariance: either a scalar times identity or an explicit
/// diagonal.
#[derive(Debug, Clone)]
pub enum Diagonal<'a> {
  Single(f64),
  Multiple(ArrayView<'a, f64, Ix1>)
}
impl<'a> Diagonal<'a> {
  /// Checks every entry is a usable variance for an `n` dimensional space.
  pub fn validate(&self, n: usize) -> Result<()> {
    match self {
      &Diagonal::Single(v) => check_variance(0, v),
      &Diagonal::Multiple(ref v) => {
        if v.len() != n {
          return Err(Error::shape("error vector", n, v.len()));
        }
        v.iter()
          .enumerate()
          .map(|(i, &v)| check_variance(i, v) )
          .collect()
      },
    }
  }
}
fn check_variance(index: usize, value: f64) -> Result<()> {
  if value.is_finite() && value > 0.0 {
    Ok(())
  } else {
    Err(Error::InvalidVariance {
      index: index,
      value: value,
    })
  }
}
impl<'a> Index<usize> for Diagonal<'a> {
  type Output = f64;
  fn index(&self, idx: usize) -> &f64 {
    match self {
      &Diagonal::Single(ref e) => e,
      &Diagonal::Multiple(ref v) => &v[idx],
    }
  }
}
impl<'a> From<f64> for Diagonal<'a> {
  fn from(v: f64) -> Diagonal<'a> {
    Diagonal::Single(v)
  }
}
impl<'a> From<ArrayView<'a, f64, Ix1>> for Diagonal<'a> {
  fn from(v: ArrayView<'a, f64, Ix1>) -> Self {
    Diagonal::Multiple(v)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::arr1;

  #[derive(Clone, Debug, PartialEq)]
  struct Pair(f64, f64);
  impl Aggregate for Pair {
    const WIDTH: usize = 2;
    fn write_into(&self, mut out: ArrayViewMut<f64, Ix1>) {
      out[0] = self.0;
      out[1] = self.1;
    }
    fn read_from(v: ArrayView<f64, Ix1>) -> Pair { Pair(v[0], v[1]) }
  }
  #[derive(Clone, Debug, PartialEq)]
  struct Rate(f64);
  impl Aggregate for Rate {
    const WIDTH: usize = 1;
    fn write_into(&self, mut out: ArrayViewMut<f64, Ix1>) { out[0] = self.0; }
    fn read_from(v: ArrayView<f64, Ix1>) -> Rate { Rate(v[0]) }
  }

  struct Decay;
  impl Model for Decay {
    type State = Pair;
    type Params = Rate;
    fn observation_dim(&self) -> usize { 1 }
    fn step(&self, s: &Pair, p: &Rate) -> Pair {
      Pair(s.0 * p.0, s.1 + s.0)
    }
    fn observe(&self, s: &Pair, _: &Rate, mut out: ArrayViewMut<f64, Ix1>) {
      out[0] = s.1;
    }
  }

  #[test]
  fn estimate_layout() {
    let e: Estimate<Decay> = Estimate::new(Pair(1.0, 2.0), Rate(0.5));
    assert_eq!(e.to_array(), arr1(&[1.0, 2.0, 0.5]));

    let back = Estimate::<Decay>::from_view(arr1(&[3.0, 4.0, 5.0]).view())
      .expect("from_view");
    assert_eq!(back.state, Pair(3.0, 4.0));
    assert_eq!(back.params, Rate(5.0));

    assert!(Estimate::<Decay>::from_view(arr1(&[1.0]).view()).is_err());
  }

  #[test]
  fn packed_carries_params() {
    let d = Packed(&Decay);
    assert_eq!(d.state_dim(), 3);
    let x = arr1(&[2.0, 0.0, 0.5]);
    let next = d.transition(x.view());
    assert_eq!(next, arr1(&[1.0, 2.0, 0.5]));
    assert_eq!(d.observation(next.view()), arr1(&[2.0]));
  }

  #[test]
  fn diagonal_validation() {
    assert!(Diagonal::from(1.0).validate(4).is_ok());
    assert!(Diagonal::from(0.0).validate(4).is_err());

    let v = arr1(&[1.0, 2.0]);
    let d = Diagonal::from(v.view());
    assert_eq!(d[1], 2.0);
    assert!(d.validate(2).is_ok());
    match d.validate(3) {
      Err(Error::ShapeMismatch { expected: 3, got: 2, .. }) => {},
      r => panic!("unexpected {:?}", r),
    }

    let bad = arr1(&[1.0, ::std::f64::NAN]);
    match Diagonal::from(bad.view()).validate(2) {
      Err(Error::InvalidVariance { index: 1, .. }) => {},
      r => panic!("unexpected {:?}", r),
    }
  }
}
