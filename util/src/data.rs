
use nd::{Array, Ix2};
use nac::{Error, Result};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const CODE_FIELD: usize = 1;
const DEATHS_FIELD: usize = 3;

/// Reads daily deaths for `country` from a CSV with rows of the form
/// `entity,code,date,daily_deaths` and returns the last `size` values of the
/// running total, one per row.
pub fn load_cumulative_deaths<P>(path: P, country: &str, size: usize)
  -> Result<Array<f64, Ix2>>
  where P: AsRef<Path>,
{
  let f = File::open(path.as_ref())?;
  let deaths = cumulative_deaths(BufReader::new(f), country, size)?;
  info!("loaded {} days of deaths for {} from {}",
        deaths.dim().0, country, path.as_ref().display());
  Ok(deaths)
}

pub fn cumulative_deaths<R>(reader: R, country: &str, size: usize)
  -> Result<Array<f64, Ix2>>
  where R: BufRead,
{
  let mut deaths = Vec::new();
  let mut cumulative = 0.0;
  for (idx, line) in reader.lines().enumerate() {
    let line = line?;
    let fields: Vec<&str> = line.split(',').collect();
    if fields.get(CODE_FIELD) != Some(&country) { continue; }

    let raw = fields.get(DEATHS_FIELD)
      .map(|v| v.trim() )
      .unwrap_or("");
    let daily: f64 = raw.parse()
      .map_err(|_| {
        Error::Parse {
          line: idx + 1,
          value: raw.to_string(),
        }
      })?;
    cumulative += daily;
    deaths.push(cumulative);
  }

  if deaths.len() < size {
    return Err(Error::InsufficientData {
      requested: size,
      available: deaths.len(),
    });
  }

  let tail = deaths.split_off(deaths.len() - size);
  Array::from_shape_vec((size, 1), tail)
    .map_err(|_| Error::shape("deaths", size, 0) )
}

#[cfg(test)]
mod test {
  use super::*;
  use std::io::Cursor;

  const CSV: &'static str = "Entity,Code,Day,Daily deaths\n\
                             Poland,POL,2020-03-12,1\n\
                             Germany,DEU,2020-03-12,2\n\
                             Poland,POL,2020-03-13,2\n\
                             Poland,POL,2020-03-14,0\n\
                             Poland,POL,2020-03-15,3\r\n";

  #[test]
  fn accumulates_tail() {
    let d = cumulative_deaths(Cursor::new(CSV), "POL", 3)
      .expect("load failed");
    assert_eq!(d.dim(), (3, 1));
    assert_eq!(d.column(0).to_vec(), vec![3.0, 3.0, 6.0]);
  }

  #[test]
  fn other_country() {
    let d = cumulative_deaths(Cursor::new(CSV), "DEU", 1)
      .expect("load failed");
    assert_eq!(d[[0, 0]], 2.0);
  }

  #[test]
  fn too_few_rows() {
    match cumulative_deaths(Cursor::new(CSV), "POL", 5) {
      Err(Error::InsufficientData { requested: 5, available: 4 }) => {},
      r => panic!("unexpected {:?}", r),
    }
  }

  #[test]
  fn bad_value() {
    let csv = "Poland,POL,2020-03-12,1\nPoland,POL,2020-03-13,n/a\n";
    match cumulative_deaths(Cursor::new(csv), "POL", 1) {
      Err(Error::Parse { line: 2, ref value }) if value == "n/a" => {},
      r => panic!("unexpected {:?}", r),
    }
  }

  #[test]
  fn missing_file() {
    match load_cumulative_deaths("/nonexistent/covid-deaths.csv", "POL", 1) {
      Err(Error::Io(_)) => {},
      r => panic!("unexpected {:?}", r),
    }
  }
}
