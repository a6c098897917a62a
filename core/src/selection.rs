//! Selection of scale-factor curves for the comparison plots.

use crate::calibration::{load_file, Calibration, JetFlavor, OperatingPoint};
use crate::catalog::{CampaignSpec, Catalog};
use crate::formula::PiecewiseFunction;
use crate::prelude::{CalibrationError, CalibrationResult};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Supplies the calibration table a campaign refers to.
pub trait CalibrationSource {
    fn load(&mut self, campaign: &CampaignSpec) -> CalibrationResult<Calibration>;
}

/// Reads campaign files from disk, relative to an input directory.
pub struct FileSource {
    input_path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(input_path: P) -> Self {
        Self {
            input_path: input_path.as_ref().to_path_buf(),
        }
    }

    /// Bare file names live in the input directory; anything with a `/` is
    /// used as given.
    pub fn resolve(&self, input_file: &str) -> PathBuf {
        if input_file.contains('/') {
            PathBuf::from(input_file)
        } else {
            self.input_path.join(input_file)
        }
    }
}

impl CalibrationSource for FileSource {
    fn load(&mut self, campaign: &CampaignSpec) -> CalibrationResult<Calibration> {
        load_file(self.resolve(&campaign.input_file))
    }
}

/// The three curves drawn for every selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variation {
    Central,
    Up,
    Down,
}

impl Variation {
    pub const ALL: [Variation; 3] = [Variation::Central, Variation::Up, Variation::Down];

    pub fn as_str(self) -> &'static str {
        match self {
            Variation::Central => "central",
            Variation::Up => "up",
            Variation::Down => "down",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompareRequest {
    pub taggers: Vec<String>,
    pub years: Vec<String>,
    pub operating_points: Vec<String>,
    /// `None` selects every measurement type the catalog lists for the flavour.
    pub measurement_types: Option<Vec<String>>,
    pub flavor: JetFlavor,
}

#[derive(Debug, Clone)]
pub struct ScaleFactorCurve {
    pub group: String,
    pub variation: Variation,
    pub function: PiecewiseFunction,
    pub color_index: usize,
}

impl ScaleFactorCurve {
    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn is_central(&self) -> bool {
        self.variation == Variation::Central
    }
}

/// Builds the central/up/down functions of one measurement, or `None` when
/// the table holds no matching entry.
pub fn build_curve_group(
    calibration: &Calibration,
    operating_point: OperatingPoint,
    measurement_type: &str,
    flavor: JetFlavor,
    title: &str,
) -> CalibrationResult<Option<Vec<(Variation, PiecewiseFunction)>>> {
    let mut functions: Vec<(Variation, PiecewiseFunction)> = Variation::ALL
        .iter()
        .map(|&variation| {
            (
                variation,
                PiecewiseFunction::new(format!("{}_{}", title, variation.as_str())),
            )
        })
        .collect();

    for entry in calibration.matching(operating_point, measurement_type, flavor) {
        if let Some((_, function)) = functions
            .iter_mut()
            .find(|(variation, _)| variation.as_str() == entry.params.sys_type)
        {
            function.push(entry.params.pt_min, entry.params.pt_max, &entry.formula)?;
        }
    }

    if functions.iter().all(|(_, function)| function.is_empty()) {
        return Ok(None);
    }
    Ok(Some(functions))
}

pub fn select_curves<S: CalibrationSource>(
    catalog: &Catalog,
    request: &CompareRequest,
    source: &mut S,
) -> CalibrationResult<Vec<ScaleFactorCurve>> {
    let mut curves = Vec::new();
    let mut color_index = 1;

    for tagger_name in &request.taggers {
        let Some(tagger) = catalog.tagger(tagger_name) else {
            warn!("tagger {} is not in the catalog -> skipping", tagger_name);
            continue;
        };

        for campaign in tagger
            .campaigns
            .iter()
            .filter(|campaign| campaign.matches_any_year(&request.years))
        {
            let calibration = source.load(campaign)?;
            let known_types = campaign.measurement_types.for_flavor(request.flavor);

            for (label, operating_point) in campaign.requested_points(&request.operating_points) {
                let Some(operating_point) = operating_point else {
                    warn!("working point {} not supported -> skipping", label);
                    continue;
                };

                let wanted = request.measurement_types.as_deref().unwrap_or(known_types);
                for measurement_type in wanted
                    .iter()
                    .filter(|m| !m.is_empty() && known_types.contains(*m))
                {
                    let title = format!(
                        "{}_{}_{}_{}",
                        tagger.name, campaign.name, label, measurement_type
                    );
                    let Some(group) = build_curve_group(
                        &calibration,
                        operating_point,
                        measurement_type,
                        request.flavor,
                        &title,
                    )?
                    else {
                        warn!("no entries for {} -> skipping", title);
                        continue;
                    };

                    debug!("selected curve group {} with color {}", title, color_index);
                    curves.extend(group.into_iter().map(|(variation, function)| {
                        ScaleFactorCurve {
                            group: title.clone(),
                            variation,
                            function,
                            color_index,
                        }
                    }));
                    color_index += 1;
                }
            }
        }
    }

    if curves.is_empty() {
        return Err(CalibrationError::EmptySelection(
            "no scale factors to plot".into(),
        ));
    }
    info!("selected {} scale-factor curves", curves.len());
    Ok(curves)
}

/// Name of the output plot, built from the raw option strings.
pub fn plot_title(taggers: &str, years: &str, wps: &str, flavour: &str, meastypes: &str) -> String {
    let mut title = format!("{}_{}_{}_{}", taggers, years, wps, flavour);
    if meastypes != "default" {
        title.push('_');
        title.push_str(meastypes);
    }
    title
}
