//! Scale-factor formulas and the piecewise functions built from them.

pub mod expr;
pub mod piecewise;

pub use expr::Formula;
pub use piecewise::{PiecewiseFunction, Segment};
