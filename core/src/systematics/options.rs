use crate::systematics::key::MergedGroup;
use serde::{Deserialize, Serialize};

/// Controls which systematic sources are merged and which are kept apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Separate year-uncorrelated sources from the correlated ones.
    pub year_correlations: bool,
    /// Keep the type-2 sources as individual variations.
    pub split_type2: bool,
    /// Additional sources kept as individual variations.
    pub custom: Vec<String>,
    pub uncorrelated: Vec<String>,
    pub type2: Vec<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            year_correlations: true,
            split_type2: false,
            custom: Vec::new(),
            uncorrelated: vec!["statistic".into()],
            type2: vec!["pileup".into(), "jes".into(), "jer".into()],
        }
    }
}

impl MergeOptions {
    /// Suffix describing the merge, appended to the output file name.
    pub fn output_flag(&self) -> String {
        let mut flag = String::new();
        if self.year_correlations {
            flag.push_str("_years");
        }
        if self.split_type2 {
            flag.push_str("_type2");
        }
        if flag.is_empty() {
            flag.push_str("_basic");
        }
        for custom in &self.custom {
            flag.push('_');
            flag.push_str(custom);
        }
        flag
    }

    /// Sources that are copied through instead of merged.
    pub fn split_list(&self) -> Vec<String> {
        let mut split = self.custom.clone();
        if self.split_type2 {
            split.extend(self.type2.iter().cloned());
        }
        split
    }

    /// A basic merge keeps only the totals and has nothing to merge into.
    pub fn is_basic(&self) -> bool {
        !self.year_correlations && !self.split_type2 && self.custom.is_empty()
    }

    pub fn merged_groups(&self) -> Vec<MergedGroup> {
        if self.is_basic() {
            Vec::new()
        } else if self.year_correlations {
            vec![MergedGroup::Correlated, MergedGroup::Uncorrelated]
        } else {
            vec![MergedGroup::Unsplit]
        }
    }

    /// Group a merged source contributes to.
    pub fn group_for(&self, source: &str) -> MergedGroup {
        if !self.year_correlations {
            MergedGroup::Unsplit
        } else if self.uncorrelated.iter().any(|name| name == source) {
            MergedGroup::Uncorrelated
        } else {
            MergedGroup::Correlated
        }
    }
}
