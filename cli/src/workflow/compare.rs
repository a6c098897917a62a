use crate::workflow::config::ToolConfig;
use anyhow::{bail, Context};
use btagcore::calibration::{load_file, JetFlavor};
use btagcore::catalog::{CampaignSpec, Catalog};
use btagcore::selection::{plot_title, select_curves, CompareRequest, FileSource};
use btagplot::{render_comparison, PlotFormat};
use log::info;
use std::path::{Path, PathBuf};

/// Options of the `compare` command, as given on the command line.
#[derive(Clone, Debug)]
pub struct CompareSettings {
    pub taggers: String,
    pub years: String,
    pub input_path: PathBuf,
    pub input_files: String,
    pub custom_files: bool,
    pub wps: String,
    pub meastypes: String,
    pub flavour: String,
    pub plot_format: String,
    pub plot_dir: PathBuf,
}

pub struct CompareResult {
    pub title: String,
    pub curve_count: usize,
    pub written: Vec<PathBuf>,
}

fn split_dashes(value: &str) -> Vec<String> {
    value
        .split('-')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn file_stem(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().replace(".csv", ""))
        .unwrap_or_default()
}

/// Registers every extra CSV file as a campaign of its own and returns the
/// campaign names, which join the requested years.
fn register_input_files(
    catalog: &mut Catalog,
    input_files: &str,
    input_path: &Path,
) -> anyhow::Result<Vec<String>> {
    let mut campaigns = Vec::new();
    for csv_file in input_files.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        let path = if csv_file.contains('/') {
            PathBuf::from(csv_file)
        } else {
            input_path.join(csv_file)
        };
        let stem = file_stem(&path);
        let tagger = stem.split('_').next().unwrap_or_default().to_lowercase();

        let calibration = load_file(&path)
            .with_context(|| format!("loading custom calibration {}", path.display()))?;
        let campaign = CampaignSpec::from_calibration(&stem, &path.to_string_lossy(), &calibration);
        info!(
            "registered {} as campaign {} of tagger {}",
            path.display(),
            stem,
            tagger
        );
        catalog.register(&tagger, campaign);
        campaigns.push(stem);
    }
    Ok(campaigns)
}

pub fn run_compare(settings: &CompareSettings, config: &ToolConfig) -> anyhow::Result<CompareResult> {
    let Some(flavor) = JetFlavor::from_option(&settings.flavour) else {
        bail!("wrong choice of jet flavour: {}", settings.flavour);
    };
    let formats = PlotFormat::parse_list(&settings.plot_format).context("parsing plot formats")?;

    let mut catalog = config.catalog();
    if settings.custom_files {
        catalog.clear();
    }

    let mut years = split_dashes(&settings.years);
    years.extend(register_input_files(
        &mut catalog,
        &settings.input_files,
        &settings.input_path,
    )?);

    let request = CompareRequest {
        taggers: split_dashes(&settings.taggers)
            .into_iter()
            .map(|tagger| tagger.to_lowercase())
            .collect(),
        years,
        operating_points: split_dashes(&settings.wps),
        measurement_types: (settings.meastypes != "default").then(|| split_dashes(&settings.meastypes)),
        flavor,
    };

    let mut source = FileSource::new(&settings.input_path);
    let curves =
        select_curves(&catalog, &request, &mut source).context("selecting scale factors")?;

    let title = plot_title(
        &settings.taggers,
        &settings.years,
        &settings.wps,
        &settings.flavour,
        &settings.meastypes,
    );
    let written = render_comparison(&title, &curves, &settings.plot_dir, &formats, &config.plot)
        .with_context(|| format!("rendering plot {}", title))?;

    Ok(CompareResult {
        title,
        curve_count: curves.len(),
        written,
    })
}
