
use std::borrow::Cow;
use std::iter::{ExactSizeIterator};
use std::io::Stdout;
use std::time::Duration;

use pbr::ProgressBar;

/// Drives a progress bar while iterating over `inner`. The bar is closed
/// when `inner` runs out or the iterator is dropped early.
pub struct ReportingIterator<I>
  where I: ExactSizeIterator,
{
  name: Cow<'static, str>,
  progress: ProgressBar<Stdout>,
  finished: bool,
  inner: I,
}
impl<I> ReportingIterator<I>
  where I: ExactSizeIterator,
{
  pub fn new(inner: I, name: Cow<'static, str>) -> ReportingIterator<I> {
    let mut p = ProgressBar::new(inner.len() as _);
    p.show_speed = false;
    p.show_percent = true;
    p.show_counter = true;
    p.show_time_left = true;

    let fps = Duration::new(1, 0) / 60;
    p.set_max_refresh_rate(Some(fps));

    let msg = format!("{}: ", name);
    p.message(&msg[..]);
    ReportingIterator {
      name: name,
      progress: p,
      finished: false,
      inner: inner,
    }
  }

  /// Replaces the text shown before the bar, eg with the current cost.
  pub fn note(&mut self, note: &str) {
    let msg = format!("{} ({}): ", self.name, note);
    self.progress.message(&msg[..]);
  }

  fn finish(&mut self) {
    if self.finished { return; }
    self.finished = true;

    let msg = format!("{} done!\n", self.name);
    self.progress.finish_println(&msg);
  }
}

impl<I> Iterator for ReportingIterator<I>
  where I: ExactSizeIterator,
{
  type Item = I::Item;
  fn next(&mut self) -> Option<Self::Item> {
    match self.inner.next() {
      Some(v) => {
        self.progress.inc();
        Some(v)
      },
      None => {
        self.finish();
        None
      },
    }
  }
}
impl<I> Drop for ReportingIterator<I>
  where I: ExactSizeIterator,
{
  fn drop(&mut self) {
    self.finish();
  }
}
