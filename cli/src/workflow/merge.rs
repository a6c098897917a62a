use crate::workflow::config::ToolConfig;
use anyhow::Context;
use btagcore::calibration::codec::tagger_from_path;
use btagcore::calibration::{load_file, save_file};
use btagcore::systematics::{MergeOptions, MergeReport, SystematicsMerger};
use std::fs;
use std::path::{Path, PathBuf};

/// Options of the `merge` command, as given on the command line.
#[derive(Clone, Debug)]
pub struct MergeRequest {
    pub input_file: String,
    pub output_file: String,
    pub csv_path: PathBuf,
    pub year_correlations_off: bool,
    pub split_type2: bool,
    pub custom: Option<String>,
}

pub struct MergeRun {
    pub output: PathBuf,
    pub report: MergeReport,
}

impl MergeRequest {
    pub fn to_options(&self, config: &ToolConfig) -> MergeOptions {
        MergeOptions {
            year_correlations: !self.year_correlations_off,
            split_type2: self.split_type2,
            custom: self
                .custom
                .as_deref()
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            uncorrelated: config.merge.uncorrelated.clone(),
            type2: config.merge.type2.clone(),
        }
    }
}

/// `<csv_path>/<output_file><flag>.csv`, where `default` in the output name
/// stands for the input file's stem.
pub fn output_path(csv_path: &Path, input_file: &str, output_file: &str, flag: &str) -> PathBuf {
    let stem = input_file.replace(".csv", "");
    let name = format!("{}{}.csv", output_file.replace("default", &stem), flag);
    csv_path.join(name)
}

pub fn run_merge(request: &MergeRequest, config: &ToolConfig) -> anyhow::Result<MergeRun> {
    let options = request.to_options(config);
    let output = output_path(
        &request.csv_path,
        &request.input_file,
        &request.output_file,
        &options.output_flag(),
    );
    let input_path = request.csv_path.join(&request.input_file);

    let input = load_file(&input_path)
        .with_context(|| format!("loading calibration {}", input_path.display()))?;
    let outcome = SystematicsMerger::new(options)
        .merge(&input, &tagger_from_path(&output))
        .with_context(|| format!("merging systematics of {}", input_path.display()))?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    save_file(&outcome.calibration, &output)
        .with_context(|| format!("writing merged calibration {}", output.display()))?;

    Ok(MergeRun {
        output,
        report: outcome.report,
    })
}

pub fn write_report(report: &MergeReport, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("serializing merge report")?;
    fs::write(path, json).with_context(|| format!("writing merge report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use btagcore::systematics::symmetric_shift;

    const RAW: &str = "DeepCSV;OperatingPoint, measurementType, sysType, jetFlavor, etaMin, etaMax, ptMin, ptMax, discrMin, discrMax, formula \n\
1, comb, central, 0, 0, 2.4, 20, 1000, 0, 1, \"0.95\" \n\
1, comb, up, 0, 0, 2.4, 20, 1000, 0, 1, \"0.95+0.05\" \n\
1, comb, down, 0, 0, 2.4, 20, 1000, 0, 1, \"0.95-0.05\" \n\
1, comb, up_jes, 0, 0, 2.4, 20, 1000, 0, 1, \"0.95+0.03\" \n\
1, comb, down_jes, 0, 0, 2.4, 20, 1000, 0, 1, \"0.95-0.03\" \n\
1, comb, up_statistic, 0, 0, 2.4, 20, 1000, 0, 1, \"0.95+0.04\" \n\
1, comb, down_statistic, 0, 0, 2.4, 20, 1000, 0, 1, \"0.95-0.04\" \n";

    fn request(dir: &Path) -> MergeRequest {
        MergeRequest {
            input_file: "DeepCSV_102XSF_V1.csv".into(),
            output_file: "default".into(),
            csv_path: dir.to_path_buf(),
            year_correlations_off: false,
            split_type2: false,
            custom: None,
        }
    }

    #[test]
    fn output_path_substitutes_input_stem() {
        let path = output_path(Path::new("./CSVFiles/"), "DeepCSV_102XSF_V1.csv", "default", "_years");
        assert!(path.ends_with("DeepCSV_102XSF_V1_years.csv"));
        let named = output_path(Path::new("out"), "in.csv", "combined", "_basic_jes");
        assert_eq!(named, PathBuf::from("out/combined_basic_jes.csv"));
    }

    #[test]
    fn custom_list_becomes_split_sources() {
        let mut req = request(Path::new("."));
        req.year_correlations_off = true;
        req.custom = Some("jes, gluon".into());
        let options = req.to_options(&ToolConfig::default());
        assert_eq!(options.custom, vec!["jes", "gluon"]);
        assert_eq!(options.output_flag(), "_basic_jes_gluon");
    }

    #[test]
    fn merge_writes_consolidated_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("DeepCSV_102XSF_V1.csv"), RAW).unwrap();

        let run = run_merge(&request(dir.path()), &ToolConfig::default()).unwrap();
        assert!(run.output.ends_with("DeepCSV_102XSF_V1_years.csv"));

        let merged = load_file(&run.output).unwrap();
        assert_eq!(merged.tagger(), "DeepCSV");
        let sys_types: Vec<&str> = merged
            .entries()
            .iter()
            .map(|entry| entry.params.sys_type.as_str())
            .collect();
        assert_eq!(
            sys_types,
            vec![
                "central",
                "up",
                "down",
                "up_correlated",
                "down_correlated",
                "up_uncorrelated",
                "down_uncorrelated"
            ]
        );
        let shift = symmetric_shift(&merged.entries()[3].formula).unwrap();
        assert!((shift - 0.03).abs() < 1e-12);
        assert_eq!(run.report.merged_entries, 4);

        let report_path = dir.path().join("reports/merge.json");
        write_report(&run.report, &report_path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(json["output_flag"], "_years");
        assert_eq!(json["groups"][1], "uncorrelated");
    }

    #[test]
    fn report_directory_failure_names_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("reports");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_report(&MergeReport::default(), &blocker.join("merge.json")).unwrap_err();
        assert!(err.to_string().starts_with("creating report directory"));
    }
}
