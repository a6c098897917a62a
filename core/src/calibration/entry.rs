use crate::prelude::{CalibrationError, CalibrationResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tagger threshold an entry was measured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperatingPoint {
    Loose,
    Medium,
    Tight,
    Reshaping,
}

impl OperatingPoint {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Loose),
            1 => Some(Self::Medium),
            2 => Some(Self::Tight),
            3 => Some(Self::Reshaping),
            _ => None,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            Self::Loose => 0,
            Self::Medium => 1,
            Self::Tight => 2,
            Self::Reshaping => 3,
        }
    }

    /// Parses the `L`/`M`/`T` working-point labels used on the command line.
    /// The reshaping pseudo-point has no plottable label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "l" => Some(Self::Loose),
            "m" => Some(Self::Medium),
            "t" => Some(Self::Tight),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Loose => "L",
            Self::Medium => "M",
            Self::Tight => "T",
            Self::Reshaping => "shape_corr",
        }
    }
}

/// Hadron flavour of the jet the scale factor applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JetFlavor {
    B,
    C,
    Udsg,
}

impl JetFlavor {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::B),
            1 => Some(Self::C),
            2 => Some(Self::Udsg),
            _ => None,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            Self::B => 0,
            Self::C => 1,
            Self::Udsg => 2,
        }
    }

    /// Accepts both the letter (`b`, `c`, `l`) and the numeric spelling.
    pub fn from_option(token: &str) -> Option<Self> {
        match token {
            "b" | "0" => Some(Self::B),
            "c" | "1" => Some(Self::C),
            "l" | "2" => Some(Self::Udsg),
            _ => None,
        }
    }
}

/// Bin and variation an entry's formula is valid for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub operating_point: OperatingPoint,
    pub measurement_type: String,
    pub sys_type: String,
    pub jet_flavor: JetFlavor,
    pub eta_min: f64,
    pub eta_max: f64,
    pub pt_min: f64,
    pub pt_max: f64,
    pub discr_min: f64,
    pub discr_max: f64,
}

impl Parameters {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        operating_point: OperatingPoint,
        measurement_type: &str,
        sys_type: &str,
        jet_flavor: JetFlavor,
        eta: (f64, f64),
        pt: (f64, f64),
        discr: (f64, f64),
    ) -> Self {
        Self {
            operating_point,
            measurement_type: measurement_type.to_lowercase(),
            sys_type: sys_type.to_lowercase(),
            jet_flavor,
            eta_min: eta.0,
            eta_max: eta.1,
            pt_min: pt.0,
            pt_max: pt.1,
            discr_min: discr.0,
            discr_max: discr.1,
        }
    }

    /// Same bin with a different variation label.
    pub fn with_sys_type(&self, sys_type: &str) -> Self {
        Self {
            sys_type: sys_type.to_lowercase(),
            ..self.clone()
        }
    }
}

/// One line of a calibration table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub params: Parameters,
    pub formula: String,
}

impl Entry {
    pub fn new(formula: impl Into<String>, params: Parameters) -> Self {
        Self {
            params,
            formula: formula.into(),
        }
    }

    /// Builds an entry from the eleven trimmed tokens of a CSV line.
    pub fn from_tokens(tokens: &[&str], line: u64) -> CalibrationResult<Self> {
        let invalid = |reason: String| CalibrationError::InvalidLine { line, reason };

        if tokens.len() != 11 {
            return Err(invalid(format!("expected 11 tokens, found {}", tokens.len())));
        }
        if let Some(position) = tokens.iter().position(|token| token.is_empty()) {
            return Err(invalid(format!("field {} is empty", position + 1)));
        }

        let op_index = parse_index(tokens[0]).ok_or_else(|| {
            invalid(format!("operating point `{}` is not an index", tokens[0]))
        })?;
        let operating_point = OperatingPoint::from_index(op_index)
            .ok_or_else(|| invalid(format!("operating point {} > 3", op_index)))?;

        let flavor_index = parse_index(tokens[3])
            .ok_or_else(|| invalid(format!("jet flavor `{}` is not an index", tokens[3])))?;
        let jet_flavor = JetFlavor::from_index(flavor_index)
            .ok_or_else(|| invalid(format!("jet flavor {} > 2", flavor_index)))?;

        let mut bounds = [0.0_f64; 6];
        for (slot, token) in bounds.iter_mut().zip(&tokens[4..10]) {
            *slot = token
                .parse::<f64>()
                .map_err(|_| invalid(format!("bin boundary `{}` is not a number", token)))?;
        }

        let sys_type = strip_quoting(tokens[2]);
        let formula = strip_quoting(tokens[10]);
        if formula.is_empty() {
            return Err(invalid("empty formula".into()));
        }

        let params = Parameters::new(
            operating_point,
            tokens[1],
            &sys_type,
            jet_flavor,
            (bounds[0], bounds[1]),
            (bounds[2], bounds[3]),
            (bounds[4], bounds[5]),
        );
        Ok(Self::new(formula, params))
    }

    pub fn to_csv_line(&self) -> String {
        let p = &self.params;
        format!(
            "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, \"{}\" \n",
            p.operating_point.index(),
            p.measurement_type,
            p.sys_type,
            p.jet_flavor.index(),
            p.eta_min,
            p.eta_max,
            p.pt_min,
            p.pt_max,
            p.discr_min,
            p.discr_max,
            self.formula
        )
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.params;
        write!(
            f,
            "{} {} {} flav={} eta=[{}, {}] pt=[{}, {}] discr=[{}, {}]",
            p.operating_point.label(),
            p.measurement_type,
            p.sys_type,
            p.jet_flavor.index(),
            p.eta_min,
            p.eta_max,
            p.pt_min,
            p.pt_max,
            p.discr_min,
            p.discr_max
        )
    }
}

fn parse_index(token: &str) -> Option<u32> {
    token.parse::<u32>().ok()
}

fn strip_quoting(token: &str) -> String {
    token
        .chars()
        .filter(|c| !matches!(c, ' ' | '"' | '\n'))
        .collect()
}

/// Name of the systematic source encoded in a sys type (`up_jes` -> `jes`).
pub fn variation_name(sys_type: &str) -> Option<&str> {
    sys_type.split('_').nth(1)
}

/// True for the `central`, `up` and `down` entries that every table carries.
pub fn is_total(sys_type: &str) -> bool {
    matches!(sys_type, "central" | "up" | "down")
}
