
use nd::{Array, ArrayView, Axis, Ix1, Ix2};
use rand::Rng;
use rayon::prelude::*;

use problem::Problem;

/// Saltelli's scheme without second order terms. For each of the `n` base
/// points there's a block of `D + 2` rows: `A`, `AB_1 .. AB_D`, `B`, where
/// `AB_i` is `A` with column `i` taken from `B`.
pub fn sample<R>(problem: &Problem, n: usize, rand: &mut R) -> Array<f64, Ix2>
  where R: Rng + ?Sized,
{
  let d = problem.num_vars();
  let block = d + 2;
  let mut out = Array::zeros((n * block, d));

  for j in 0..n {
    let draw = |rand: &mut R| -> Vec<f64> {
      problem.bounds
        .iter()
        .map(|b| rand.gen_range(b.start..=b.end) )
        .collect()
    };
    let a = draw(&mut *rand);
    let b = draw(&mut *rand);

    let base = j * block;
    for c in 0..d {
      out[[base, c]] = a[c];
      out[[base + block - 1, c]] = b[c];
      for i in 0..d {
        out[[base + 1 + i, c]] = if c == i { b[c] } else { a[c] };
      }
    }
  }

  debug!("drew {} samples of {} parameters", out.dim().0, d);
  out
}

/// Runs `model` on every row of `samples`, in parallel on the current rayon
/// pool.
pub fn evaluate<F>(samples: ArrayView<f64, Ix2>, model: F) -> Array<f64, Ix1>
  where F: Fn(ArrayView<f64, Ix1>) -> f64 + Sync + Send,
{
  let out: Vec<f64> = samples
    .axis_iter(Axis(0))
    .into_par_iter()
    .map(|row| model(row) )
    .collect();
  Array::from(out)
}
