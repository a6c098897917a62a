use crate::calibration::{JetFlavor, OperatingPoint, Parameters};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Bound = OrderedFloat<f64>;

/// Target of a merged set of systematic sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergedGroup {
    Correlated,
    Uncorrelated,
    Unsplit,
}

impl MergedGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            MergedGroup::Correlated => "correlated",
            MergedGroup::Uncorrelated => "uncorrelated",
            MergedGroup::Unsplit => "unsplit",
        }
    }
}

impl fmt::Display for MergedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement and group a set of bins belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub operating_point: OperatingPoint,
    pub measurement_type: String,
    pub group: MergedGroup,
    pub jet_flavor: JetFlavor,
}

impl GroupKey {
    pub fn of(params: &Parameters, group: MergedGroup) -> Self {
        Self {
            operating_point: params.operating_point,
            measurement_type: params.measurement_type.clone(),
            group,
            jet_flavor: params.jet_flavor,
        }
    }
}

/// Kinematic and discriminant boundaries of one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinKey {
    pub eta_min: Bound,
    pub eta_max: Bound,
    pub pt_min: Bound,
    pub pt_max: Bound,
    pub discr_min: Bound,
    pub discr_max: Bound,
}

impl BinKey {
    pub fn of(params: &Parameters) -> Self {
        Self {
            eta_min: OrderedFloat(params.eta_min),
            eta_max: OrderedFloat(params.eta_max),
            pt_min: OrderedFloat(params.pt_min),
            pt_max: OrderedFloat(params.pt_max),
            discr_min: OrderedFloat(params.discr_min),
            discr_max: OrderedFloat(params.discr_max),
        }
    }

    /// True when this bin lies inside the eta/pt envelope of `outer` and
    /// shares its discriminant range.
    pub fn within(&self, outer: &BinKey) -> bool {
        self.eta_min >= outer.eta_min
            && self.eta_max <= outer.eta_max
            && self.pt_min >= outer.pt_min
            && self.pt_max <= outer.pt_max
            && self.discr_min == outer.discr_min
            && self.discr_max == outer.discr_max
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} flav={}",
            self.operating_point.label(),
            self.measurement_type,
            self.group,
            self.jet_flavor.index()
        )
    }
}

impl fmt::Display for BinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "eta=[{}, {}] pt=[{}, {}] discr=[{}, {}]",
            self.eta_min, self.eta_max, self.pt_min, self.pt_max, self.discr_min, self.discr_max
        )
    }
}
