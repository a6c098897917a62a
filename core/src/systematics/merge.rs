use crate::calibration::{is_total, variation_name, Calibration, Entry};
use crate::prelude::{CalibrationError, CalibrationResult};
use crate::systematics::key::{BinKey, GroupKey, MergedGroup};
use crate::systematics::options::MergeOptions;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;

/// Bin structure discovered from a table's total-uncertainty entries, with
/// the squared shifts accumulated per bin.
#[derive(Debug, Clone, Default)]
pub struct UncertaintyTable {
    groups: BTreeMap<GroupKey, BTreeMap<BinKey, f64>>,
}

impl UncertaintyTable {
    /// Registers, for every merged group, each bin that carries an `up` entry.
    pub fn discover(calibration: &Calibration, groups: &[MergedGroup]) -> Self {
        let mut table = Self::default();
        for entry in calibration
            .entries()
            .iter()
            .filter(|entry| entry.params.sys_type == "up")
        {
            let bin = BinKey::of(&entry.params);
            for &group in groups {
                table
                    .groups
                    .entry(GroupKey::of(&entry.params, group))
                    .or_default()
                    .entry(bin)
                    .or_insert(0.0);
            }
        }
        table
    }

    pub fn accumulate(&mut self, group: GroupKey, bin: BinKey, shift: f64) -> CalibrationResult<()> {
        let total = self
            .groups
            .get_mut(&group)
            .and_then(|bins| bins.get_mut(&bin))
            .ok_or_else(|| CalibrationError::UndiscoveredBin(format!("{} {}", group, bin)))?;
        *total += shift * shift;
        Ok(())
    }

    pub fn bins(&self, group: &GroupKey) -> Option<&BTreeMap<BinKey, f64>> {
        self.groups.get(group)
    }

    pub fn bin_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }
}

/// Shift of a symmetric `up_*` variation written as `central+shift`.
pub fn symmetric_shift(formula: &str) -> CalibrationResult<f64> {
    let (_, shift) = formula
        .rsplit_once('+')
        .ok_or_else(|| CalibrationError::UnsupportedShift(formula.to_string()))?;
    shift
        .trim()
        .parse::<f64>()
        .map_err(|_| CalibrationError::UnsupportedShift(formula.to_string()))
}

/// Plain decimal with at least one fractional digit (`0.0`, not `0`).
fn decimal(value: f64) -> String {
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    pub output_flag: String,
    pub groups: Vec<MergedGroup>,
    pub input_entries: usize,
    pub discovered_bins: usize,
    pub passthrough_entries: usize,
    /// Number of `up_*` sources accumulated into each group.
    pub merged_sources: BTreeMap<String, usize>,
    pub merged_entries: usize,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub calibration: Calibration,
    pub report: MergeReport,
}

/// Merges systematic-uncertainty sources of a calibration in quadrature.
pub struct SystematicsMerger {
    options: MergeOptions,
    split: Vec<String>,
    groups: Vec<MergedGroup>,
}

impl SystematicsMerger {
    pub fn new(options: MergeOptions) -> Self {
        let split = options.split_list();
        let groups = options.merged_groups();
        Self {
            options,
            split,
            groups,
        }
    }

    fn is_split(&self, sys_type: &str) -> bool {
        variation_name(sys_type).is_some_and(|name| self.split.iter().any(|s| s == name))
    }

    fn is_passthrough(&self, sys_type: &str) -> bool {
        is_total(sys_type) || self.is_split(sys_type)
    }

    pub fn merge(&self, input: &Calibration, tagger: &str) -> CalibrationResult<MergeOutcome> {
        let mut report = MergeReport {
            output_flag: self.options.output_flag(),
            groups: self.groups.clone(),
            input_entries: input.len(),
            ..Default::default()
        };

        let mut table = UncertaintyTable::default();
        if !self.groups.is_empty() {
            table = UncertaintyTable::discover(input, &self.groups);
            report.discovered_bins = table.bin_count();
            self.accumulate_sources(input, &mut table, &mut report)?;
        }

        let mut output = Calibration::new(tagger);
        for entry in input
            .entries()
            .iter()
            .filter(|entry| self.is_passthrough(&entry.params.sys_type))
        {
            output.add_entry(entry.clone());
            report.passthrough_entries += 1;
        }

        for &group in &self.groups {
            report.merged_entries += self.emit_group(input, &table, group, &mut output);
        }

        info!(
            "merged {} entries into {} ({} copied, {} merged, flag {})",
            report.input_entries,
            output.len(),
            report.passthrough_entries,
            report.merged_entries,
            report.output_flag
        );

        Ok(MergeOutcome {
            calibration: output,
            report,
        })
    }

    fn accumulate_sources(
        &self,
        input: &Calibration,
        table: &mut UncertaintyTable,
        report: &mut MergeReport,
    ) -> CalibrationResult<()> {
        for entry in input.entries() {
            let sys_type = entry.params.sys_type.as_str();
            if !sys_type.starts_with("up_") || self.is_split(sys_type) {
                continue;
            }
            let source = variation_name(sys_type).unwrap_or_default();
            let group = self.options.group_for(source);
            let shift = symmetric_shift(&entry.formula)?;
            debug!("{} -> {} shift {}", entry, group, shift);

            table.accumulate(
                GroupKey::of(&entry.params, group),
                BinKey::of(&entry.params),
                shift,
            )?;
            *report
                .merged_sources
                .entry(group.as_str().to_string())
                .or_default() += 1;
        }
        Ok(())
    }

    /// Emits `up_<group>`/`down_<group>` for every discovered bin inside each
    /// central entry's envelope. Returns the number of entries added.
    fn emit_group(
        &self,
        input: &Calibration,
        table: &UncertaintyTable,
        group: MergedGroup,
        output: &mut Calibration,
    ) -> usize {
        let up = format!("up_{}", group);
        let down = format!("down_{}", group);
        let mut emitted = 0;

        for central in input
            .entries()
            .iter()
            .filter(|entry| entry.params.sys_type == "central")
        {
            let Some(bins) = table.bins(&GroupKey::of(&central.params, group)) else {
                debug!("no {} bins for {}", group, central);
                continue;
            };
            let envelope = BinKey::of(&central.params);

            for (bin, sum_of_squares) in bins.iter().filter(|(bin, _)| bin.within(&envelope)) {
                let total = decimal(sum_of_squares.sqrt());
                for (sys_type, sign) in [(&up, '+'), (&down, '-')] {
                    let mut params = central.params.with_sys_type(sys_type);
                    params.eta_min = bin.eta_min.into_inner();
                    params.eta_max = bin.eta_max.into_inner();
                    params.pt_min = bin.pt_min.into_inner();
                    params.pt_max = bin.pt_max.into_inner();
                    let formula = format!("{}{}{}", central.formula, sign, total);
                    output.add_entry(Entry::new(formula, params));
                    emitted += 1;
                }
            }
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::read_calibration;

    const RAW: &str = "\
1, comb, central, 0, 0, 2.4, 20, 1000, 0, 1, \"0.95\" \n\
1, comb, up, 0, 0, 2.4, 20, 50, 0, 1, \"0.95+0.05\" \n\
1, comb, down, 0, 0, 2.4, 20, 50, 0, 1, \"0.95-0.05\" \n\
1, comb, up, 0, 0, 2.4, 50, 1000, 0, 1, \"0.95+0.08\" \n\
1, comb, down, 0, 0, 2.4, 50, 1000, 0, 1, \"0.95-0.08\" \n\
1, comb, up_jes, 0, 0, 2.4, 20, 50, 0, 1, \"0.95+0.03\" \n\
1, comb, down_jes, 0, 0, 2.4, 20, 50, 0, 1, \"0.95-0.03\" \n\
1, comb, up_pileup, 0, 0, 2.4, 20, 50, 0, 1, \"0.95+0.04\" \n\
1, comb, down_pileup, 0, 0, 2.4, 20, 50, 0, 1, \"0.95-0.04\" \n\
1, comb, up_statistic, 0, 0, 2.4, 20, 50, 0, 1, \"0.95+0.02\" \n\
1, comb, down_statistic, 0, 0, 2.4, 20, 50, 0, 1, \"0.95-0.02\" \n\
1, comb, up_jes, 0, 0, 2.4, 50, 1000, 0, 1, \"0.95+0.06\" \n\
1, comb, down_jes, 0, 0, 2.4, 50, 1000, 0, 1, \"0.95-0.06\" \n";

    fn raw() -> Calibration {
        read_calibration(RAW.as_bytes(), "DeepCSV").unwrap()
    }

    fn formulas_of<'a>(calibration: &'a Calibration, sys_type: &str) -> Vec<(f64, &'a str)> {
        calibration
            .entries()
            .iter()
            .filter(|entry| entry.params.sys_type == sys_type)
            .map(|entry| (entry.params.pt_min, entry.formula.as_str()))
            .collect()
    }

    fn quadrature(shifts: &[f64]) -> f64 {
        shifts.iter().fold(0.0, |sum, shift| sum + shift * shift).sqrt()
    }

    fn decimal_total(shifts: &[f64]) -> String {
        decimal(quadrature(shifts))
    }

    #[test]
    fn totals_keep_a_fractional_digit() {
        assert_eq!(decimal(0.0), "0.0");
        assert_eq!(decimal(2.0), "2.0");
        assert_eq!(decimal(0.05), "0.05");
    }

    #[test]
    fn shift_is_taken_after_last_plus() {
        assert_eq!(symmetric_shift("(0.9*x)+0.05").unwrap(), 0.05);
        assert!(symmetric_shift("0.9*x").is_err());
        assert!(symmetric_shift("0.9+x").is_err());
    }

    #[test]
    fn year_merge_splits_statistic_from_correlated_sources() {
        let outcome = SystematicsMerger::new(MergeOptions::default())
            .merge(&raw(), "DeepCSV")
            .unwrap();
        let output = &outcome.calibration;

        assert_eq!(formulas_of(output, "central").len(), 1);
        assert_eq!(formulas_of(output, "up").len(), 2);
        assert!(formulas_of(output, "up_jes").is_empty());

        let low = format!("0.95+{}", decimal_total(&[0.03, 0.04]));
        let high = format!("0.95+{}", decimal_total(&[0.06]));
        assert_eq!(
            formulas_of(output, "up_correlated"),
            vec![(20.0, low.as_str()), (50.0, high.as_str())]
        );

        let statistic = format!("0.95-{}", decimal_total(&[0.02]));
        assert_eq!(
            formulas_of(output, "down_uncorrelated"),
            vec![(20.0, statistic.as_str()), (50.0, "0.95-0.0")]
        );

        assert_eq!(outcome.report.merged_sources["correlated"], 3);
        assert_eq!(outcome.report.merged_sources["uncorrelated"], 1);
        assert_eq!(outcome.report.merged_entries, 8);
        assert_eq!(outcome.report.passthrough_entries, 5);
    }

    #[test]
    fn split_sources_are_copied_and_excluded_from_merge() {
        let options = MergeOptions {
            year_correlations: false,
            split_type2: true,
            ..Default::default()
        };
        let outcome = SystematicsMerger::new(options).merge(&raw(), "DeepCSV").unwrap();
        let output = &outcome.calibration;

        assert_eq!(formulas_of(output, "up_jes").len(), 2);
        assert_eq!(formulas_of(output, "down_pileup").len(), 1);
        let statistic = format!("0.95+{}", decimal_total(&[0.02]));
        assert_eq!(
            formulas_of(output, "up_unsplit"),
            vec![(20.0, statistic.as_str()), (50.0, "0.95+0.0")]
        );
        assert!(formulas_of(output, "up_correlated").is_empty());
    }

    #[test]
    fn basic_merge_keeps_only_totals() {
        let options = MergeOptions {
            year_correlations: false,
            ..Default::default()
        };
        let outcome = SystematicsMerger::new(options).merge(&raw(), "DeepCSV").unwrap();
        assert_eq!(outcome.calibration.len(), 5);
        assert_eq!(outcome.report.discovered_bins, 0);
        assert!(outcome.report.groups.is_empty());
    }

    #[test]
    fn merged_bins_carry_their_own_boundaries() {
        let outcome = SystematicsMerger::new(MergeOptions::default())
            .merge(&raw(), "DeepCSV")
            .unwrap();
        let merged: Vec<&Entry> = outcome
            .calibration
            .entries()
            .iter()
            .filter(|entry| entry.params.sys_type == "up_correlated")
            .collect();
        assert_eq!(merged[0].params.pt_max, 50.0);
        assert_eq!(merged[1].params.pt_min, 50.0);
        assert_eq!(merged[1].params.pt_max, 1000.0);
        assert_eq!(outcome.calibration.tagger(), "DeepCSV");
    }

    #[test]
    fn merged_totals_follow_each_central_envelope() {
        let text = "\
1, comb, central, 0, 0, 1.2, 20, 1000, 0, 1, \"0.9\" \n\
1, comb, central, 0, 1.2, 2.4, 20, 1000, 0, 1, \"1.1\" \n\
1, comb, up, 0, 1.2, 2.4, 20, 1000, 0, 1, \"1.1+0.08\" \n\
1, comb, up, 0, 0, 1.2, 50, 1000, 0, 1, \"0.9+0.09\" \n\
1, comb, up, 0, 0, 1.2, 20, 50, 0, 1, \"0.9+0.05\" \n\
1, comb, up, 0, 0, 1.2, 20, 50, 0, 0.5, \"0.9+0.1\" \n\
1, comb, up_jes, 0, 0, 1.2, 50, 1000, 0, 1, \"0.9+0.06\" \n\
1, comb, up_jes, 0, 0, 1.2, 20, 50, 0, 1, \"0.9+0.03\" \n\
1, comb, up_jes, 0, 1.2, 2.4, 20, 1000, 0, 1, \"1.1+0.05\" \n\
1, comb, up_jes, 0, 0, 1.2, 20, 50, 0, 0.5, \"0.9+0.07\" \n";
        let input = read_calibration(text.as_bytes(), "DeepCSV").unwrap();
        let outcome = SystematicsMerger::new(MergeOptions::default())
            .merge(&input, "DeepCSV")
            .unwrap();

        let down: Vec<(f64, f64, String)> = outcome
            .calibration
            .entries()
            .iter()
            .filter(|entry| entry.params.sys_type == "down_correlated")
            .map(|entry| (entry.params.eta_min, entry.params.pt_min, entry.formula.clone()))
            .collect();
        assert_eq!(
            down,
            vec![
                (0.0, 20.0, format!("0.9-{}", decimal_total(&[0.03]))),
                (0.0, 50.0, format!("0.9-{}", decimal_total(&[0.06]))),
                (1.2, 20.0, format!("1.1-{}", decimal_total(&[0.05]))),
            ]
        );

        // the narrower discriminant bin is discovered but matches no central entry
        assert_eq!(outcome.report.discovered_bins, 8);
        assert_eq!(outcome.report.merged_entries, 12);
        assert!(outcome
            .calibration
            .entries()
            .iter()
            .filter(|entry| entry.params.sys_type.ends_with("correlated"))
            .all(|entry| entry.params.discr_max == 1.0));
    }

    #[test]
    fn source_without_total_bin_is_an_error() {
        let text = format!(
            "{}1, comb, up_jes, 0, 0, 2.4, 1000, 2000, 0, 1, \"0.95+0.06\" \n",
            RAW
        );
        let input = read_calibration(text.as_bytes(), "DeepCSV").unwrap();
        let err = SystematicsMerger::new(MergeOptions::default())
            .merge(&input, "DeepCSV")
            .unwrap_err();
        assert!(matches!(err, CalibrationError::UndiscoveredBin(_)));
    }
}
