//! Strong-constraint 4D-Var: estimate the initial state (and any parameters
//! folded into it) whose forecast best explains a window of observations,
//! weighted against a background estimate.
//!
//! The cost is
//!
//! ```text
//! J(x) = ½ Σ_i (x_i - xb_i)² / B_i  +  ½ Σ_k ‖H(M^k x) - y_k‖² / R
//!        \_________ Jb ___________/     \__________ Jo __________/
//! ```
//!
//! written as ½‖r(x)‖² over the stacked, weighted residuals r. It's
//! minimized with L-BFGS, the gradient being Jᵀr with J the forward
//! difference Jacobian of r.

use nd::{aview1, s, Array, ArrayView, Ix1, Ix2};
use nac::{Diagonal, Dynamics, Error, Estimate, FnDynamics, Model, Packed,
          Result};
use util::progress::ReportingIterator;

use argmin::core::{CostFunction, Executor, Gradient, IterState, State,
                   TerminationReason};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;

use std::cell::RefCell;

/// Reported in place of a cost that overflowed. Well below `f64::MAX` so the
/// line search's interpolation stays finite.
const NON_FINITE_COST: f64 = 1.0e150;

type Minimizer = LBFGS<MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64>,
                       Vec<f64>, Vec<f64>, f64>;

#[derive(Debug, Clone)]
pub struct Config {
  /// Background variance used when the caller gives no error vector.
  pub background_variance: f64,
  pub observation_variance: f64,
  /// Per window.
  pub max_iterations: u64,
  /// Stop once J changes by less than this between iterations.
  pub cost_tolerance: f64,
  /// Stop once ‖∇J‖ falls below this.
  pub gradient_tolerance: f64,
  /// Correction pairs kept by L-BFGS.
  pub memory: usize,
  /// Fit this many observations first and double until the whole series is
  /// used. `None` fits the whole series at once.
  pub initial_window: Option<usize>,
}
impl Default for Config {
  fn default() -> Self {
    Config {
      background_variance: 1.0e4,
      observation_variance: 0.1,
      max_iterations: 200,
      cost_tolerance: ::std::f64::EPSILON,
      gradient_tolerance: ::std::f64::EPSILON.sqrt(),
      memory: 10,
      initial_window: Some(10),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Analysis {
  pub state: Array<f64, Ix1>,
  /// J = Jb + Jo over the full window.
  pub cost: f64,
  pub background_cost: f64,
  pub observation_cost: f64,
  /// Summed over all windows.
  pub iterations: u64,
  /// False when the last window stopped at the iteration cap.
  pub converged: bool,
}

fn half_sum_sq(r: &Array<f64, Ix1>) -> f64 {
  0.5 * r.iter().map(|v| v * v ).sum::<f64>()
}

/// Lowest cost evaluated so far in the current window. Lives outside the
/// minimizer so an aborted line search still leaves its best point behind.
struct Best {
  param: Vec<f64>,
  cost: f64,
  evaluations: usize,
}

struct Cost<'a, D>
  where D: Dynamics + ?Sized + 'a,
{
  dynamics: &'a D,
  background: Array<f64, Ix1>,
  background_sd: Array<f64, Ix1>,
  observations: Array<f64, Ix2>,
  observation_sd: f64,
  verbose: bool,
  best: &'a RefCell<Best>,
  /// Residuals at the last point `cost` was asked for; `gradient` follows
  /// at the same point.
  last: RefCell<Option<(Vec<f64>, Array<f64, Ix1>)>>,
}
impl<'a, D> Cost<'a, D>
  where D: Dynamics + ?Sized,
{
  fn new(dynamics: &'a D, background: ArrayView<f64, Ix1>,
         background_error: &Diagonal, observations: ArrayView<f64, Ix2>,
         observation_sd: f64, verbose: bool,
         best: &'a RefCell<Best>) -> Cost<'a, D> {
    let n = background.len();
    Cost {
      dynamics: dynamics,
      background: background.to_owned(),
      background_sd: Array::from_shape_fn(n, |i| background_error[i].sqrt() ),
      observations: observations.to_owned(),
      observation_sd: observation_sd,
      verbose: verbose,
      best: best,
      last: RefCell::new(None),
    }
  }

  fn residual_len(&self) -> usize {
    let (steps, p) = self.observations.dim();
    self.background.len() + steps * p
  }
  fn residuals(&self, x: ArrayView<f64, Ix1>) -> Array<f64, Ix1> {
    let n = self.background.len();
    let (steps, p) = self.observations.dim();
    let mut r = Array::zeros(self.residual_len());

    for i in 0..n {
      r[i] = (x[i] - self.background[i]) / self.background_sd[i];
    }

    let mut state = x.to_owned();
    for (k, y) in self.observations.outer_iter().enumerate() {
      let predicted = self.dynamics.observation(state.view());
      let mut rk = r.slice_mut(s![n + k * p..n + (k + 1) * p]);
      rk.assign(&predicted);
      rk -= &y;
      rk /= self.observation_sd;

      if k + 1 < steps {
        state = self.dynamics.transition(state.view());
      }
    }

    r
  }
  fn residuals_at(&self, param: &[f64]) -> Array<f64, Ix1> {
    if let Some((ref p, ref r)) = *self.last.borrow() {
      if &p[..] == param {
        return r.clone();
      }
    }
    let r = self.residuals(aview1(param));
    *self.last.borrow_mut() = Some((param.to_vec(), r.clone()));
    r
  }

  /// (Jb, Jo)
  fn split(&self, r: &Array<f64, Ix1>) -> (f64, f64) {
    let n = self.background.len();
    let jb = r.slice(s![..n]).iter().map(|v| v * v ).sum::<f64>() * 0.5;
    let jo = r.slice(s![n..]).iter().map(|v| v * v ).sum::<f64>() * 0.5;
    (jb, jo)
  }

  fn note(&self, param: &[f64], j: f64) {
    let mut best = self.best.borrow_mut();
    best.evaluations += 1;
    if !(j < best.cost) { return; }

    best.param = param.to_vec();
    best.cost = j;
    if self.verbose {
      info!("  Intermediate current state at evaluation {}: {} (J = {:e})",
            best.evaluations, aview1(param), j);
    } else {
      trace!("evaluation {}: J = {:e}, x = {}", best.evaluations, j,
             aview1(param));
    }
  }
}
impl<'a, D> CostFunction for Cost<'a, D>
  where D: Dynamics + ?Sized,
{
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, param: &Vec<f64>) -> ::std::result::Result<f64, argmin::core::Error> {
    let j = half_sum_sq(&self.residuals_at(param));
    let j = if j.is_finite() { j } else { NON_FINITE_COST };
    self.note(param, j);
    Ok(j)
  }
}
impl<'a, D> Gradient for Cost<'a, D>
  where D: Dynamics + ?Sized,
{
  type Param = Vec<f64>;
  type Gradient = Vec<f64>;

  /// Jᵀr, one forward difference of r per component of `param`.
  fn gradient(&self, param: &Vec<f64>) -> ::std::result::Result<Vec<f64>, argmin::core::Error> {
    let r0 = self.residuals_at(param);
    let sqrt_eps = ::std::f64::EPSILON.sqrt();
    let mut x = Array::from(param.clone());
    let mut grad = vec![0.0; param.len()];

    for i in 0..param.len() {
      let h = sqrt_eps * param[i].abs().max(1.0);
      x[i] = param[i] + h;
      let r = self.residuals(x.view());
      x[i] = param[i];

      let g = r.iter()
        .zip(r0.iter())
        .map(|(ri, r0i)| (ri - r0i) / h * r0i )
        .sum::<f64>();
      grad[i] = if g.is_finite() { g } else { 0.0 };
    }

    Ok(grad)
  }
}

/// Sizes of the successive assimilation windows.
pub fn window_schedule(initial: Option<usize>, total: usize) -> Vec<usize> {
  let mut windows = Vec::new();
  if let Some(mut w) = initial {
    while w > 0 && w < total {
      windows.push(w);
      w *= 2;
    }
  }
  windows.push(total);
  windows
}

pub struct FourDVar<'a, D>
  where D: Dynamics + ?Sized + 'a,
{
  pub dynamics: &'a D,
  pub config: Config,
}
impl<'a, D> FourDVar<'a, D>
  where D: Dynamics + ?Sized,
{
  pub fn new(dynamics: &'a D) -> FourDVar<'a, D> {
    FourDVar::with_config(dynamics, Default::default())
  }
  pub fn with_config(dynamics: &'a D, config: Config) -> FourDVar<'a, D> {
    FourDVar {
      dynamics: dynamics,
      config: config,
    }
  }

  fn minimizer(&self) -> Result<Minimizer> {
    LBFGS::new(MoreThuenteLineSearch::new(), self.config.memory)
      .with_tolerance_grad(self.config.gradient_tolerance)
      .and_then(|s| s.with_tolerance_cost(self.config.cost_tolerance) )
      .map_err(|e| Error::Solver(e.to_string()) )
  }

  fn check_inputs(&self, background: ArrayView<f64, Ix1>,
                  observations: ArrayView<f64, Ix2>,
                  background_error: &Diagonal) -> Result<()> {
    let n = self.dynamics.state_dim();
    let p = self.dynamics.observation_dim();
    if background.len() != n {
      return Err(Error::shape("background state", n, background.len()));
    }
    if observations.dim().0 == 0 {
      return Err(Error::EmptyObservations);
    }
    if observations.dim().1 != p {
      return Err(Error::shape("observation width", p, observations.dim().1));
    }
    background_error.validate(n)?;
    Diagonal::Single(self.config.observation_variance).validate(p)?;
    self.minimizer()?;

    let next = self.dynamics.transition(background);
    if next.len() != n {
      return Err(Error::shape("transition output", n, next.len()));
    }
    let obs = self.dynamics.observation(background);
    if obs.len() != p {
      return Err(Error::shape("observation", p, obs.len()));
    }

    Ok(())
  }

  /// Runs L-BFGS on one window from `start`, leaving the best point seen in
  /// `cost.best`. Returns the iteration count and whether it stopped short
  /// of the cap.
  fn minimize(&self, cost: Cost<D>, start: Vec<f64>) -> Result<(u64, bool)> {
    let max_iterations = self.config.max_iterations;
    let run = Executor::new(cost, self.minimizer()?)
      .configure(|state: IterState<Vec<f64>, Vec<f64>, (), (), (), f64>| {
        state.param(start).max_iters(max_iterations)
      })
      .run();

    match run {
      Ok(result) => {
        let state = result.state();
        let capped = state.get_termination_reason() ==
          Some(&TerminationReason::MaxItersReached);
        Ok((state.get_iter(), !capped))
      },
      Err(e) => {
        // The line search gives up once J stops resolving in f64.
        debug!("L-BFGS stopped: {}", e);
        Ok((0, true))
      },
    }
  }

  /// `observations` has one row per time step, row 0 observing the initial
  /// state. `error` is the diagonal of the background error covariance.
  pub fn analyse(&self, background: ArrayView<f64, Ix1>,
                 observations: ArrayView<f64, Ix2>,
                 error: Option<ArrayView<f64, Ix1>>,
                 verbose: bool) -> Result<Analysis> {
    let background_error = match error {
      Some(v) => Diagonal::from(v),
      None => Diagonal::from(self.config.background_variance),
    };
    self.check_inputs(background, observations, &background_error)?;

    let steps = observations.dim().0;
    let windows = window_schedule(self.config.initial_window, steps);
    let observation_sd = self.config.observation_variance.sqrt();

    let mut progress = if verbose {
      Some(ReportingIterator::new(0..windows.len(), "4D-Var windows".into()))
    } else {
      None
    };

    let best = RefCell::new(Best {
      param: background.to_vec(),
      cost: ::std::f64::INFINITY,
      evaluations: 0,
    });
    let mut x = background.to_owned();
    let mut iterations = 0;
    let mut converged = true;
    for &window in windows.iter() {
      let cost = Cost::new(self.dynamics, background, &background_error,
                           observations.slice(s![..window, ..]),
                           observation_sd, verbose, &best);
      let start = half_sum_sq(&cost.residuals(x.view()));
      {
        let mut b = best.borrow_mut();
        b.param = x.to_vec();
        b.cost = if start.is_finite() { start } else { NON_FINITE_COST };
      }

      if !start.is_finite() {
        warn!("forecast over {} steps is not finite, keeping {}", window, x);
      } else if start > 0.0 {
        let (n, c) = self.minimize(cost, x.to_vec())?;
        iterations += n;
        converged = c;
      } else {
        converged = true;
      }

      let b = best.borrow();
      x = Array::from(b.param.clone());
      debug!("window of {} steps: J = {:e} after {} iterations",
             window, b.cost, iterations);
      if let Some(ref mut p) = progress {
        let _ = p.next();
        p.note(&format!("J = {:.4e}", b.cost));
      }
    }

    let full = Cost::new(self.dynamics, background, &background_error,
                         observations, observation_sd, false, &best);
    let r = full.residuals(x.view());
    let (jb, jo) = full.split(&r);

    info!("Calibration of {} coefficients on {} measures",
          background.len(), steps);
    info!("Calibration resulting coefficients: {}", x);
    if !converged {
      warn!("iteration cap reached, J = {:e}", jb + jo);
    }

    Ok(Analysis {
      state: x,
      cost: jb + jo,
      background_cost: jb,
      observation_cost: jo,
      iterations: iterations,
      converged: converged,
    })
  }
}


/// Estimates the state best explaining `observations`, starting from
/// `background`. With no `error` vector the background covariance is
/// `Config::default().background_variance` times identity.
pub fn assimilate<D>(background: ArrayView<f64, Ix1>,
                     observations: ArrayView<f64, Ix2>,
                     dynamics: &D,
                     error: Option<ArrayView<f64, Ix1>>,
                     verbose: bool) -> Result<Array<f64, Ix1>>
  where D: Dynamics + ?Sized,
{
  FourDVar::new(dynamics)
    .analyse(background, observations, error, verbose)
    .map(|a| a.state )
}

/// `assimilate` with the observation operator and transition function given
/// as plain functions.
pub fn assimilate_fns<O, T>(background: ArrayView<f64, Ix1>,
                            observations: ArrayView<f64, Ix2>,
                            observation_operator: O,
                            transition: T,
                            error: Option<ArrayView<f64, Ix1>>,
                            verbose: bool) -> Result<Array<f64, Ix1>>
  where O: Fn(ArrayView<f64, Ix1>) -> Array<f64, Ix1>,
        T: Fn(ArrayView<f64, Ix1>) -> Array<f64, Ix1>,
{
  let dynamics = FnDynamics {
    state_dim: background.len(),
    observation_dim: observations.dim().1,
    transition: transition,
    observation: observation_operator,
  };
  assimilate(background, observations, &dynamics, error, verbose)
}

pub fn assimilate_model<M>(model: &M, background: &Estimate<M>,
                           observations: ArrayView<f64, Ix2>,
                           error: Option<ArrayView<f64, Ix1>>,
                           verbose: bool) -> Result<Estimate<M>>
  where M: Model,
{
  let x = assimilate(background.to_array().view(), observations,
                     &Packed(model), error, verbose)?;
  Estimate::from_view(x.view())
}
