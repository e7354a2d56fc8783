
use nd::{Array, ArrayView, Ix1};
use nac::{Error, Result};

use problem::Problem;

#[derive(Debug, Clone)]
pub struct Indices {
  pub names: Vec<String>,
  /// Fraction of the output variance explained by each parameter alone.
  pub first_order: Array<f64, Ix1>,
  /// Including every interaction the parameter takes part in.
  pub total: Array<f64, Ix1>,
}

/// Sobol indices from model outputs over `sample(problem, ..)`, in the same
/// row order. First order uses the Saltelli (2010) estimator, total effect
/// the Jansen one.
pub fn analyze(problem: &Problem, outputs: ArrayView<f64, Ix1>) -> Result<Indices> {
  let d = problem.num_vars();
  let block = d + 2;
  if outputs.len() == 0 || outputs.len() % block != 0 {
    let expected = (outputs.len() / block).max(1) * block;
    return Err(Error::shape("model outputs", expected, outputs.len()));
  }
  let n = outputs.len() / block;

  let mean = outputs.iter()
    .enumerate()
    .filter(|&(k, _)| k % block == 0 || k % block == block - 1 )
    .map(|(_, v)| *v )
    .sum::<f64>() / (2 * n) as f64;
  // centred outputs give the same expectations with much less noise
  let y = outputs.mapv(|v| v - mean );
  let f_a = |j: usize| y[j * block];
  let f_b = |j: usize| y[j * block + block - 1];
  let f_ab = |j: usize, i: usize| y[j * block + 1 + i];

  let variance = (0..n)
    .map(|j| f_a(j) * f_a(j) + f_b(j) * f_b(j) )
    .sum::<f64>() / (2 * n) as f64;
  if !(variance.is_finite() && variance > 0.0) {
    return Err(Error::ZeroVariance);
  }

  let mut first_order = Array::zeros(d);
  let mut total = Array::zeros(d);
  for i in 0..d {
    let (s1, st) = (0..n)
      .fold((0.0, 0.0), |(s1, st), j| {
        let diff = f_ab(j, i) - f_a(j);
        (s1 + f_b(j) * diff, st + diff * diff)
      });
    first_order[i] = s1 / n as f64 / variance;
    total[i] = 0.5 * st / n as f64 / variance;
  }

  Ok(Indices {
    names: problem.names.clone(),
    first_order: first_order,
    total: total,
  })
}

#[cfg(test)]
mod test {
  use super::*;
  use sample::{evaluate, sample};
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  fn unit_cube() -> Problem {
    Problem::new(vec![("x1", 0.0..1.0), ("x2", 0.0..1.0), ("x3", 0.0..1.0)])
      .unwrap()
  }

  #[test]
  fn additive_linear() {
    // Var = (16 + 1) / 12, so S1 = 16/17, S2 = 1/17, S3 = 0.
    let p = unit_cube();
    let mut rand = StdRng::seed_from_u64(1);
    let s = sample(&p, 8192, &mut rand);
    let y = evaluate(s.view(), |x| 4.0 * x[0] + x[1] );
    let si = analyze(&p, y.view()).expect("analyze failed");

    assert!((si.first_order[0] - 16.0 / 17.0).abs() < 0.06, "{}", si.first_order);
    assert!((si.first_order[1] - 1.0 / 17.0).abs() < 0.06, "{}", si.first_order);
    assert_eq!(si.first_order[2], 0.0);
    assert!((si.total[0] - 16.0 / 17.0).abs() < 0.06, "{}", si.total);
    assert!((si.total[1] - 1.0 / 17.0).abs() < 0.06, "{}", si.total);
    assert_eq!(si.total[2], 0.0);
    assert_eq!(si.names[2], "x3");
  }

  #[test]
  fn interaction_shows_in_total() {
    // no first order effect for either factor, all variance from x1 * x2
    let p = Problem::new(vec![("x1", -1.0..1.0), ("x2", -1.0..1.0)]).unwrap();
    let mut rand = StdRng::seed_from_u64(3);
    let s = sample(&p, 8192, &mut rand);
    let y = evaluate(s.view(), |x| x[0] * x[1] );
    let si = analyze(&p, y.view()).unwrap();
    for i in 0..2 {
      assert!(si.first_order[i].abs() < 0.1, "{}", si.first_order);
      assert!(si.total[i] > 0.8, "{}", si.total);
    }
  }

  #[test]
  fn bad_outputs() {
    let p = unit_cube();
    let y = Array::from(vec![1.0; 7]);
    match analyze(&p, y.view()) {
      Err(Error::ShapeMismatch { .. }) => {},
      r => panic!("unexpected {:?}", r),
    }

    let y = Array::from(vec![2.0; 50]);
    match analyze(&p, y.view()) {
      Err(Error::ZeroVariance) => {},
      r => panic!("unexpected {:?}", r),
    }
  }
}
