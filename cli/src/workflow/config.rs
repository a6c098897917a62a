use anyhow::Context;
use btagcore::catalog::Catalog;
use btagcore::systematics::MergeOptions;
use btagplot::PlotStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Source lists used by the merge when the command line does not override
/// them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeDefaults {
    pub uncorrelated: Vec<String>,
    pub type2: Vec<String>,
}

impl Default for MergeDefaults {
    fn default() -> Self {
        let options = MergeOptions::default();
        Self {
            uncorrelated: options.uncorrelated,
            type2: options.type2,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub merge: MergeDefaults,
    pub plot: PlotStyle,
    /// Replaces the built-in catalog of calibration campaigns.
    pub catalog: Option<Catalog>,
}

impl ToolConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading tool config {}", path_ref.display()))?;
        let config: ToolConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing tool config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn catalog(&self) -> Catalog {
        self.catalog.clone().unwrap_or_else(Catalog::builtin)
    }
}
