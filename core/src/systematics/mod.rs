//! Quadrature merging of systematic-uncertainty sources.

pub mod key;
pub mod merge;
pub mod options;

pub use key::{BinKey, GroupKey, MergedGroup};
pub use merge::{symmetric_shift, MergeOutcome, MergeReport, SystematicsMerger, UncertaintyTable};
pub use options::MergeOptions;
