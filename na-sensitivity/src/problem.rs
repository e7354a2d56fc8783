
use nac::{Error, Result};

use std::ops::Range;

/// A box shaped parameter space. Bounds are inclusive.
#[derive(Debug, Clone)]
pub struct Problem {
  pub names: Vec<String>,
  pub bounds: Vec<Range<f64>>,
}
impl Problem {
  pub fn new<S>(vars: Vec<(S, Range<f64>)>) -> Result<Problem>
    where S: Into<String>,
  {
    let (names, bounds): (Vec<String>, Vec<Range<f64>>) = vars.into_iter()
      .map(|(name, bounds)| (name.into(), bounds) )
      .unzip();
    let p = Problem {
      names: names,
      bounds: bounds,
    };
    p.validate()?;
    Ok(p)
  }

  pub fn num_vars(&self) -> usize { self.names.len() }

  pub fn validate(&self) -> Result<()> {
    if self.names.is_empty() {
      return Err(Error::InvalidBounds { name: String::new(), });
    }
    if self.names.len() != self.bounds.len() {
      return Err(Error::shape("parameter bounds", self.names.len(),
                              self.bounds.len()));
    }
    for (name, b) in self.names.iter().zip(self.bounds.iter()) {
      if !(b.start.is_finite() && b.end.is_finite() && b.start < b.end) {
        return Err(Error::InvalidBounds { name: name.clone(), });
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn bounds() {
    let p = Problem::new(vec![("rho", 0.0..50.0), ("sigma", 1.0..20.0)])
      .expect("valid problem");
    assert_eq!(p.num_vars(), 2);
    assert_eq!(p.names, vec!["rho".to_string(), "sigma".to_string()]);

    match Problem::new(vec![("beta", 3.0..1.0)]) {
      Err(Error::InvalidBounds { ref name }) if name == "beta" => {},
      r => panic!("unexpected {:?}", r),
    }
    assert!(Problem::new(vec![("x", 0.0..::std::f64::NAN)]).is_err());
    assert!(Problem::new(Vec::<(&str, Range<f64>)>::new()).is_err());
  }
}
