use crate::formula::expr::Formula;
use crate::prelude::CalibrationResult;

/// A formula valid on `[pt_min, pt_max)`.
#[derive(Debug, Clone)]
pub struct Segment {
    pub pt_min: f64,
    pub pt_max: f64,
    pub formula: Formula,
}

impl Segment {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.pt_min && x < self.pt_max
    }
}

/// Scale factor as a function of pT, stitched together from the pT bins of
/// a calibration table.
///
/// When segments overlap the one added first wins; outside every segment the
/// function is zero.
#[derive(Debug, Clone)]
pub struct PiecewiseFunction {
    name: String,
    segments: Vec<Segment>,
}

impl PiecewiseFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, pt_min: f64, pt_max: f64, formula: &str) -> CalibrationResult<()> {
        self.segments.push(Segment {
            pt_min,
            pt_max,
            formula: Formula::compile(formula)?,
        });
        Ok(())
    }

    pub fn eval(&self, x: f64) -> CalibrationResult<f64> {
        match self.segments.iter().find(|segment| segment.contains(x)) {
            Some(segment) => segment.formula.eval(x),
            None => Ok(0.0),
        }
    }

    pub fn domain(&self) -> Option<(f64, f64)> {
        let first = self.segments.first()?;
        let domain = self
            .segments
            .iter()
            .fold((first.pt_min, first.pt_max), |(lo, hi), segment| {
                (lo.min(segment.pt_min), hi.max(segment.pt_max))
            });
        Some(domain)
    }

    /// Samples the function at `count` points across its domain.
    ///
    /// Points are log-spaced when the domain is strictly positive. The upper
    /// edge is sampled just inside the half-open last bin.
    pub fn sample(&self, count: usize) -> CalibrationResult<Vec<(f64, f64)>> {
        let Some((lo, hi)) = self.domain() else {
            return Ok(Vec::new());
        };
        let count = count.max(2);
        let top = hi - (hi - lo) * 1e-9;
        let log_spaced = lo > 0.0;

        (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                let x = if log_spaced {
                    (lo.ln() + t * (top.ln() - lo.ln())).exp()
                } else {
                    lo + t * (top - lo)
                }
                .clamp(lo, top);
                Ok((x, self.eval(x)?))
            })
            .collect()
    }

    pub fn extrema(&self, count: usize) -> CalibrationResult<Option<(f64, f64)>> {
        let points = self.sample(count)?;
        Ok(points.iter().fold(None, |acc, &(_, y)| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        }))
    }
}
