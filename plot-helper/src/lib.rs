
extern crate gnuplot;
extern crate ndarray as nd;
extern crate na_core as nac;
#[macro_use] extern crate log;

use nd::{ArrayView, Ix1, Ix2, Axis,};
use nac::{Error, Result};

use gnuplot::{Figure, PlotOption, DashType, AxesCommon, Axes3D};

use std::path::PathBuf;

/// `graphs/` two levels above the running binary, ie beside `target/`.
pub fn out_dir() -> Result<PathBuf> {
  let current_exe = ::std::env::current_exe()?;
  let dir = current_exe
    .parent()
    .map(|p| p.join("../../graphs") )
    .unwrap_or_else(|| PathBuf::from("graphs") );
  ::std::fs::create_dir_all(&dir)?;
  Ok(dir)
}

fn program_name() -> String {
  ::std::env::current_exe()
    .ok()
    .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned() ) )
    .unwrap_or_else(|| "plot".to_string() )
}

pub fn skip_gui() -> bool {
  ::std::env::args()
    .position(|v| v == "--no-gui" )
    .is_some()
}

/// Writes the figure built by `mk` to `graphs/<program>-<suffix>.png` and,
/// unless `--no-gui` was passed, shows it in a window too.
fn render<F>(suffix: &str, mut mk: F) -> Result<()>
  where F: FnMut(&mut Figure),
{
  let out_name = out_dir()?
    .join(format!("{}-{}.png", program_name(), suffix));

  let mut all = Figure::new();
  all.set_terminal("pngcairo", &out_name.display().to_string()[..]);
  mk(&mut all);
  all.show()
    .map_err(|e| Error::Plot(format!("{:?}", e)) )?;
  info!("wrote {}", out_name.display());

  if skip_gui() { return Ok(()); }

  let mut all = Figure::new();
  all.set_terminal("wxt", "");
  mk(&mut all);
  all.show()
    .map_err(|e| Error::Plot(format!("{:?}", e)) )?;
  Ok(())
}

/// One panel per observed component: the observations as points, the
/// forecast of the estimate as a line and, if given, the forecast of the
/// background dashed.
pub fn make_fit_plots(what: &str, suffix: &str, labels: &[&str],
                      observations: ArrayView<f64, Ix2>,
                      fitted: ArrayView<f64, Ix2>,
                      background: Option<ArrayView<f64, Ix2>>) -> Result<()> {
  let (steps, width) = observations.dim();
  if fitted.dim() != (steps, width) {
    return Err(Error::shape("fitted series", steps * width,
                            fitted.len()));
  }
  if let Some(b) = background {
    if b.dim() != (steps, width) {
      return Err(Error::shape("background series", steps * width, b.len()));
    }
  }

  render(suffix, |all| {
    for j in 0..width {
      let label = labels.get(j).cloned().unwrap_or("observed");
      let axis = all.axes2d();
      axis.set_pos_grid(width as u32, 1, j as u32);
      let title = format!("{}, {}", what, label);
      axis.set_title(&title[..], &[]);
      axis.set_x_label("step, k", &[]);
      axis.points(0..steps, observations.column(j).iter(),
                  &[PlotOption::Caption("observation"),
                    PlotOption::PointSymbol('x'),]);
      axis.lines(0..steps, fitted.column(j).iter(),
                 &[PlotOption::Caption("analysis"),]);
      if let Some(b) = background {
        axis.lines(0..steps, b.column(j).iter(),
                   &[PlotOption::Caption("background"),
                     PlotOption::LineStyle(DashType::Dash)]);
      }
    }
  })
}

/// Trajectories through a three dimensional state, one panel each.
pub fn make_3d_plot(name: &str, fsuffix: &str,
                    plots: &[(&str, ArrayView<f64, Ix2>)]) -> Result<()> {
  for &(_, ref v) in plots.iter() {
    if v.dim().1 < 3 {
      return Err(Error::shape("trajectory width", 3, v.dim().1));
    }
  }

  let pname = program_name();
  let mk_axis = |axis: &mut Axes3D, what: &str, v: ArrayView<f64, Ix2>| {
    let title = format!("{}, {} from {}", name, what, pname);
    axis.set_title(&title[..], &[]);
    axis.set_x_label("x", &[]);
    axis.set_y_label("y", &[]);
    axis.set_z_label("z", &[]);

    axis.lines(v.index_axis(Axis(1), 0).iter(),
               v.index_axis(Axis(1), 1).iter(),
               v.index_axis(Axis(1), 2).iter(),
               &[PlotOption::Caption(what),]);
  };

  render(fsuffix, |all| {
    for &(what, ref v) in plots.iter() {
      let axis = all.axes3d();
      mk_axis(axis, what, v.view());
    }
  })
}

/// First order indices as boxes, total indices as points over them. Boxes
/// are numbered from 1 in the order of `names`.
pub fn make_sensitivity_plot(what: &str, fsuffix: &str, names: &[String],
                             first_order: ArrayView<f64, Ix1>,
                             total: ArrayView<f64, Ix1>) -> Result<()> {
  let d = names.len();
  if first_order.len() != d {
    return Err(Error::shape("first order indices", d, first_order.len()));
  }
  if total.len() != d {
    return Err(Error::shape("total indices", d, total.len()));
  }

  let xs = || (1..d + 1).map(|i| i as f64 );
  let x_label = names.iter()
    .enumerate()
    .map(|(i, n)| format!("{}: {}", i + 1, n) )
    .collect::<Vec<_>>()
    .join(", ");

  render(fsuffix, |all| {
    let axis = all.axes2d();
    let title = format!("Sobol indices of {}", what);
    axis.set_title(&title[..], &[]);
    axis.set_x_label(&x_label[..], &[]);
    axis.boxes(xs(), first_order.iter(),
               &[PlotOption::Caption("first order"),]);
    axis.points(xs(), total.iter(),
                &[PlotOption::Caption("total"),
                  PlotOption::PointSymbol('O'),]);
  })
}
