use crate::style::PlotStyle;
use crate::{RenderError, RenderResult};
use btagcore::selection::ScaleFactorCurve;
use log::warn;

/// Axis ranges of a comparison plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotFrame {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl PlotFrame {
    /// The x range spans every curve's pT domain; the y range spans the
    /// sampled values clipped to the style's floor and ceiling, then padded.
    pub fn from_curves(curves: &[ScaleFactorCurve], style: &PlotStyle) -> RenderResult<Self> {
        let mut x_range: Option<(f64, f64)> = None;
        let mut y_range: Option<(f64, f64)> = None;

        for curve in curves {
            let Some((lo, hi)) = curve.function.domain() else {
                continue;
            };
            x_range = Some(merge(x_range, lo, hi));
            if let Some((y_lo, y_hi)) = curve.function.extrema(style.samples)? {
                y_range = Some(merge(y_range, y_lo, y_hi));
            }
        }

        let (Some((mut x_min, x_max)), Some((y_lo, y_hi))) = (x_range, y_range) else {
            return Err(RenderError::EmptyPlot("no curve has a pT domain".into()));
        };

        if x_min <= 0.0 {
            warn!("pT range starts at {} -> clamping to 1 for the log axis", x_min);
            x_min = 1.0_f64.min(x_max / 2.0);
        }

        let mut y_lo = y_lo.max(style.y_floor);
        let mut y_hi = y_hi.min(style.y_ceiling);
        if y_lo >= y_hi {
            y_lo = style.y_floor;
            y_hi = style.y_ceiling;
        }

        Ok(Self {
            x_min,
            x_max,
            y_min: y_lo - style.padding,
            y_max: y_hi + style.padding,
        })
    }
}

fn merge(range: Option<(f64, f64)>, lo: f64, hi: f64) -> (f64, f64) {
    match range {
        Some((a, b)) => (a.min(lo), b.max(hi)),
        None => (lo, hi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btagcore::formula::PiecewiseFunction;
    use btagcore::selection::Variation;

    fn curve(name: &str, pt: (f64, f64), formula: &str) -> ScaleFactorCurve {
        let mut function = PiecewiseFunction::new(name);
        function.push(pt.0, pt.1, formula).unwrap();
        ScaleFactorCurve {
            group: name.to_string(),
            variation: Variation::Central,
            function,
            color_index: 1,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn frame_spans_all_domains_and_clips_values() {
        let curves = vec![
            curve("a_central", (20.0, 100.0), "0.9"),
            curve("b_central", (30.0, 1000.0), "2.0"),
        ];
        let frame = PlotFrame::from_curves(&curves, &PlotStyle::default()).unwrap();
        assert_eq!(frame.x_min, 20.0);
        assert_eq!(frame.x_max, 1000.0);
        assert!(close(frame.y_min, 0.8));
        assert!(close(frame.y_max, 1.6));
    }

    #[test]
    fn frame_applies_floor() {
        let curves = vec![curve("a_central", (20.0, 100.0), "0.5+0.005*x")];
        let frame = PlotFrame::from_curves(&curves, &PlotStyle::default()).unwrap();
        assert!(close(frame.y_min, 0.6));
        assert!(frame.y_max > 0.9 && frame.y_max < 1.1);
    }

    #[test]
    fn frame_without_curves_is_an_error() {
        let empty = ScaleFactorCurve {
            group: "empty".into(),
            variation: Variation::Up,
            function: PiecewiseFunction::new("empty_up"),
            color_index: 1,
        };
        assert!(matches!(
            PlotFrame::from_curves(&[empty], &PlotStyle::default()),
            Err(RenderError::EmptyPlot(_))
        ));
    }
}
