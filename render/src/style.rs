use crate::{RenderError, RenderResult};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// First colours of the ROOT palette, indexed from 1.
const ROOT_PALETTE: [RGBColor; 9] = [
    RGBColor(0, 0, 0),
    RGBColor(255, 0, 0),
    RGBColor(0, 255, 0),
    RGBColor(0, 0, 255),
    RGBColor(255, 255, 0),
    RGBColor(255, 0, 255),
    RGBColor(0, 255, 255),
    RGBColor(89, 212, 84),
    RGBColor(89, 84, 216),
];

/// Colour of the `index`-th curve group; groups are numbered from 1.
pub fn palette_color(index: usize) -> RGBColor {
    ROOT_PALETTE[index.saturating_sub(1) % ROOT_PALETTE.len()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    /// Lowest scale factor the frame extends to.
    pub y_floor: f64,
    /// Highest scale factor the frame extends to.
    pub y_ceiling: f64,
    pub padding: f64,
    pub samples: usize,
    pub central_width: u32,
    pub variation_width: u32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            y_floor: 0.7,
            y_ceiling: 1.5,
            padding: 0.1,
            samples: 200,
            central_width: 3,
            variation_width: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotFormat {
    Png,
    Svg,
}

impl PlotFormat {
    pub fn from_extension(ext: &str) -> RenderResult<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(RenderError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Parses a `-`-separated list such as `png-svg`.
    pub fn parse_list(formats: &str) -> RenderResult<Vec<Self>> {
        formats
            .split('-')
            .filter(|ext| !ext.is_empty())
            .map(Self::from_extension)
            .collect()
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}
