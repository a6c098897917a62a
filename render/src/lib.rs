//! Comparison plots of b-tagging scale-factor curves.

pub mod frame;
pub mod plot;
pub mod style;

pub use frame::PlotFrame;
pub use plot::render_comparison;
pub use style::{PlotFormat, PlotStyle};

use btagcore::CalibrationError;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("calibration failure: {0}")]
    Calibration(#[from] CalibrationError),
    #[error("unsupported plot format `{0}`")]
    UnsupportedFormat(String),
    #[error("nothing to draw: {0}")]
    EmptyPlot(String),
    #[error("drawing failed: {0}")]
    Drawing(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
