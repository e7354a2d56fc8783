
use nd::{Array, ArrayView, Ix1, Ix2};
use nac::{Dynamics, Error, Estimate, Model, Packed, Result};

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Observes the current state then advances it, `n` times. Row `k` is the
/// observation of the state after `k` transitions.
pub fn generate_observations<D>(dynamics: &D, start: ArrayView<f64, Ix1>,
                                n: usize) -> Result<Array<f64, Ix2>>
  where D: Dynamics + ?Sized,
{
  let p = dynamics.observation_dim();
  let mut out = Array::zeros((n, p));
  walk(dynamics, start, n, |k, state| {
    let obs = dynamics.observation(state);
    if obs.len() != p {
      return Err(Error::shape("observation", p, obs.len()));
    }
    out.row_mut(k).assign(&obs);
    Ok(())
  })?;
  Ok(out)
}

/// The first `n` states of the trajectory from `start`, `start` included.
pub fn trajectory<D>(dynamics: &D, start: ArrayView<f64, Ix1>,
                     n: usize) -> Result<Array<f64, Ix2>>
  where D: Dynamics + ?Sized,
{
  let mut out = Array::zeros((n, dynamics.state_dim()));
  walk(dynamics, start, n, |k, state| {
    out.row_mut(k).assign(&state);
    Ok(())
  })?;
  Ok(out)
}

pub fn observe_series<M>(model: &M, start: &Estimate<M>,
                         n: usize) -> Result<Array<f64, Ix2>>
  where M: Model,
{
  generate_observations(&Packed(model), start.to_array().view(), n)
}

/// Sum over the window of `|H(M^k x) - y_k|`, a quick check of how well a
/// state explains a series.
pub fn cumulative_misfit<D>(dynamics: &D, start: ArrayView<f64, Ix1>,
                            observations: ArrayView<f64, Ix2>) -> Result<f64>
  where D: Dynamics + ?Sized,
{
  let predicted = generate_observations(dynamics, start,
                                        observations.dim().0)?;
  if predicted.dim() != observations.dim() {
    return Err(Error::shape("observation width", predicted.dim().1,
                            observations.dim().1));
  }
  Ok(predicted.iter()
     .zip(observations.iter())
     .map(|(p, y)| (p - y).abs() )
     .sum())
}

/// Adds independent `N(0, std_dev²)` noise to every observation.
pub fn perturb_observations<R>(observations: ArrayView<f64, Ix2>,
                               std_dev: f64,
                               rand: &mut R) -> Result<Array<f64, Ix2>>
  where R: Rng + ?Sized,
{
  // `Normal::new` takes a negative deviation as a mirrored distribution
  if !(std_dev.is_finite() && std_dev >= 0.0) {
    return Err(Error::InvalidVariance { index: 0, value: std_dev, });
  }
  let normal = Normal::new(0.0, std_dev)
    .map_err(|_| Error::InvalidVariance { index: 0, value: std_dev, })?;
  Ok(observations.mapv(|v| v + normal.sample(rand) ))
}

fn walk<D, F>(dynamics: &D, start: ArrayView<f64, Ix1>,
              n: usize, mut f: F) -> Result<()>
  where D: Dynamics + ?Sized,
        F: FnMut(usize, ArrayView<f64, Ix1>) -> Result<()>,
{
  let dim = dynamics.state_dim();
  if start.len() != dim {
    return Err(Error::shape("start state", dim, start.len()));
  }

  let mut state = start.to_owned();
  for k in 0..n {
    f(k, state.view())?;
    if k + 1 == n { break; }

    state = dynamics.transition(state.view());
    if state.len() != dim {
      return Err(Error::shape("transition output", dim, state.len()));
    }
  }
  Ok(())
}

#[cfg(test)]
mod test {
  use super::*;
  use nac::FnDynamics;
  use nd::{arr1, arr2};
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  fn doubling() -> FnDynamics<impl Fn(ArrayView<f64, Ix1>) -> Array<f64, Ix1>,
                              impl Fn(ArrayView<f64, Ix1>) -> Array<f64, Ix1>> {
    FnDynamics {
      state_dim: 2,
      observation_dim: 1,
      transition: |x: ArrayView<f64, Ix1>| arr1(&[2.0 * x[0], x[1]]),
      observation: |x: ArrayView<f64, Ix1>| arr1(&[x[0] + x[1]]),
    }
  }

  #[test]
  fn observe_then_advance() {
    let d = doubling();
    let obs = generate_observations(&d, arr1(&[1.0, 10.0]).view(), 4)
      .expect("generate failed");
    assert_eq!(obs, arr2(&[[11.0], [12.0], [14.0], [18.0]]));

    let states = trajectory(&d, arr1(&[1.0, 10.0]).view(), 3)
      .expect("trajectory failed");
    assert_eq!(states, arr2(&[[1.0, 10.0], [2.0, 10.0], [4.0, 10.0]]));
  }

  #[test]
  fn deterministic() {
    let d = doubling();
    let start = arr1(&[0.5, -1.0]);
    let a = generate_observations(&d, start.view(), 30).unwrap();
    let b = generate_observations(&d, start.view(), 30).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn shape_errors() {
    let d = doubling();
    assert!(generate_observations(&d, arr1(&[1.0]).view(), 3).is_err());

    let bad = FnDynamics {
      state_dim: 2,
      observation_dim: 1,
      transition: |x: ArrayView<f64, Ix1>| x.to_owned(),
      observation: |x: ArrayView<f64, Ix1>| x.to_owned(),
    };
    match generate_observations(&bad, arr1(&[1.0, 2.0]).view(), 3) {
      Err(Error::ShapeMismatch { expected: 1, got: 2, .. }) => {},
      r => panic!("unexpected {:?}", r),
    }
  }

  #[test]
  fn misfit() {
    let d = doubling();
    let start = arr1(&[1.0, 10.0]);
    let obs = arr2(&[[11.0], [13.0], [13.0]]);
    let m = cumulative_misfit(&d, start.view(), obs.view()).unwrap();
    assert_eq!(m, 2.0);
  }

  #[test]
  fn noise() {
    let obs: Array<f64, Ix2> = Array::zeros((2000, 1));
    let mut rand = StdRng::seed_from_u64(1);
    let noisy = perturb_observations(obs.view(), 0.5, &mut rand).unwrap();
    let mean = noisy.sum() / 2000.0;
    let var = noisy.mapv(|v| (v - mean) * (v - mean) ).sum() / 1999.0;
    assert!(mean.abs() < 0.05, "{}", mean);
    assert!((var.sqrt() - 0.5).abs() < 0.05, "{}", var);

    match perturb_observations(obs.view(), -1.0, &mut rand) {
      Err(Error::InvalidVariance { value, .. }) => assert_eq!(value, -1.0),
      r => panic!("unexpected {:?}", r),
    }
    assert!(perturb_observations(obs.view(), ::std::f64::NAN, &mut rand)
            .is_err());
    assert!(perturb_observations(obs.view(), ::std::f64::INFINITY, &mut rand)
            .is_err());

    let exact = perturb_observations(obs.view(), 0.0, &mut rand).unwrap();
    assert_eq!(exact, obs);
  }
}
