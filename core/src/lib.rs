//! Core model for b-tagging scale-factor calibration tables.
//!
//! The modules cover the BTagCalibration CSV format, piecewise scale-factor
//! functions, the catalog of supported campaigns and the quadrature merge of
//! systematic-uncertainty sources.

pub mod calibration;
pub mod catalog;
pub mod formula;
pub mod prelude;
pub mod selection;
pub mod systematics;

pub use prelude::{CalibrationError, CalibrationResult};
