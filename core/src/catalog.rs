use crate::calibration::{Calibration, JetFlavor, OperatingPoint};
use serde::{Deserialize, Serialize};

/// Measurement types available per jet flavour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlavorMeasurements {
    pub b: Vec<String>,
    pub c: Vec<String>,
    pub light: Vec<String>,
}

impl FlavorMeasurements {
    fn heavy(b_and_c: &[&str], light: &[&str]) -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        Self {
            b: owned(b_and_c),
            c: owned(b_and_c),
            light: owned(light),
        }
    }

    pub fn for_flavor(&self, flavor: JetFlavor) -> &[String] {
        match flavor {
            JetFlavor::B => &self.b,
            JetFlavor::C => &self.c,
            JetFlavor::Udsg => &self.light,
        }
    }

    fn for_flavor_mut(&mut self, flavor: JetFlavor) -> &mut Vec<String> {
        match flavor {
            JetFlavor::B => &mut self.b,
            JetFlavor::C => &mut self.c,
            JetFlavor::Udsg => &mut self.light,
        }
    }
}

/// One calibration campaign (a data-taking year or reprocessing) of a tagger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSpec {
    pub name: String,
    pub input_file: String,
    pub measurement_types: FlavorMeasurements,
    pub operating_points: Vec<String>,
}

impl CampaignSpec {
    fn builtin(name: &str, input_file: &str, measurement_types: FlavorMeasurements) -> Self {
        Self {
            name: name.to_string(),
            input_file: input_file.to_string(),
            measurement_types,
            operating_points: ["L", "M", "T", "shape_corr"]
                .iter()
                .map(|wp| wp.to_string())
                .collect(),
        }
    }

    /// Describes a user-supplied table from the entries it actually holds.
    pub fn from_calibration(name: &str, input_file: &str, calibration: &Calibration) -> Self {
        let mut measurement_types = FlavorMeasurements::default();
        for flavor in [JetFlavor::B, JetFlavor::C, JetFlavor::Udsg] {
            *measurement_types.for_flavor_mut(flavor) = calibration.measurement_types(flavor);
        }
        Self {
            name: name.to_string(),
            input_file: input_file.to_string(),
            measurement_types,
            operating_points: calibration
                .operating_points()
                .into_iter()
                .map(|op| op.label().to_string())
                .collect(),
        }
    }

    /// Operating points of this campaign that were requested, in catalog order.
    pub fn requested_points<'a>(
        &'a self,
        requested: &'a [String],
    ) -> impl Iterator<Item = (&'a str, Option<OperatingPoint>)> + 'a {
        self.operating_points
            .iter()
            .filter(move |wp| requested.iter().any(|r| r == *wp))
            .map(|wp| (wp.as_str(), OperatingPoint::from_label(wp)))
    }

    /// Used when any requested year occurs in the campaign name
    /// (`2016` selects `Legacy2016`).
    pub fn matches_any_year(&self, years: &[String]) -> bool {
        years.iter().any(|year| self.name.contains(year.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggerSpec {
    pub name: String,
    pub campaigns: Vec<CampaignSpec>,
}

/// Table of supported taggers and their calibration campaigns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub taggers: Vec<TaggerSpec>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let comb = FlavorMeasurements::heavy(&["comb"], &["incl"]);
        let mujets = FlavorMeasurements::heavy(&["comb", "mujets"], &["incl"]);
        let ttbar = FlavorMeasurements::heavy(&["ttbar"], &["incl"]);

        let tagger = |name: &str, campaigns: Vec<CampaignSpec>| TaggerSpec {
            name: name.to_string(),
            campaigns,
        };

        Self {
            taggers: vec![
                tagger(
                    "csvv2",
                    vec![
                        CampaignSpec::builtin("2016", "btagSF_CSVv2_ichep2016.csv", comb.clone()),
                        CampaignSpec::builtin("2017", "CSVv2_94XSF_V2_B_F.csv", comb),
                    ],
                ),
                tagger(
                    "deepcsv",
                    vec![
                        CampaignSpec::builtin(
                            "Legacy2016",
                            "DeepCSV_2016LegacySF_V1.csv",
                            mujets.clone(),
                        ),
                        CampaignSpec::builtin("2017", "DeepCSV_94XSF_V4_B_F.csv", mujets.clone()),
                        CampaignSpec::builtin("2018", "DeepCSV_102XSF_V1.csv", mujets.clone()),
                    ],
                ),
                tagger(
                    "deepjet",
                    vec![
                        CampaignSpec::builtin(
                            "Legacy2016",
                            "DeepJet_2016LegacySF_V1.csv",
                            mujets.clone(),
                        ),
                        CampaignSpec::builtin("2017", "DeepFlavour_94XSF_V3_B_F.csv", mujets.clone()),
                        CampaignSpec::builtin("2018", "DeepJet_102XSF_V1.csv", mujets),
                    ],
                ),
                tagger(
                    "cmva",
                    vec![CampaignSpec::builtin("2016", "btagSF_cMVAv2_ichep2016.csv", ttbar)],
                ),
            ],
        }
    }

    pub fn clear(&mut self) {
        self.taggers.clear();
    }

    pub fn tagger(&self, name: &str) -> Option<&TaggerSpec> {
        let name = name.to_lowercase();
        self.taggers.iter().find(|tagger| tagger.name == name)
    }

    /// Adds a campaign, creating the tagger when needed and replacing any
    /// campaign with the same name.
    pub fn register(&mut self, tagger: &str, campaign: CampaignSpec) {
        let tagger = tagger.to_lowercase();
        let index = match self.taggers.iter().position(|t| t.name == tagger) {
            Some(index) => index,
            None => {
                self.taggers.push(TaggerSpec {
                    name: tagger,
                    campaigns: Vec::new(),
                });
                self.taggers.len() - 1
            }
        };
        let campaigns = &mut self.taggers[index].campaigns;
        match campaigns.iter_mut().find(|c| c.name == campaign.name) {
            Some(existing) => *existing = campaign,
            None => campaigns.push(campaign),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{Entry, Parameters};

    #[test]
    fn builtin_catalog_lists_deepcsv_campaigns() {
        let catalog = Catalog::builtin();
        let deepcsv = catalog.tagger("DeepCSV").unwrap();
        let names: Vec<&str> = deepcsv.campaigns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Legacy2016", "2017", "2018"]);
        assert_eq!(
            deepcsv.campaigns[0].measurement_types.for_flavor(JetFlavor::B),
            ["comb".to_string(), "mujets".to_string()]
        );
        assert_eq!(
            deepcsv.campaigns[0].measurement_types.for_flavor(JetFlavor::Udsg),
            ["incl".to_string()]
        );
    }

    #[test]
    fn year_matching_is_substring_based() {
        let catalog = Catalog::builtin();
        let legacy = &catalog.tagger("deepjet").unwrap().campaigns[0];
        assert!(legacy.matches_any_year(&["2016".into()]));
        assert!(!legacy.matches_any_year(&["2017".into(), "2018".into()]));
    }

    #[test]
    fn register_creates_tagger_and_replaces_campaign() {
        let mut catalog = Catalog::default();
        let mut calib = Calibration::new("mytagger");
        calib.add_entry(Entry::new(
            "1.0",
            Parameters::new(
                OperatingPoint::Medium,
                "comb",
                "central",
                JetFlavor::B,
                (0.0, 2.4),
                (20.0, 30.0),
                (0.0, 1.0),
            ),
        ));
        let spec = CampaignSpec::from_calibration("mytagger_v1", "/tmp/mytagger_v1.csv", &calib);
        assert_eq!(spec.operating_points, vec!["M"]);
        assert_eq!(spec.measurement_types.b, vec!["comb"]);
        assert!(spec.measurement_types.c.is_empty());

        catalog.register("MyTagger", spec.clone());
        catalog.register("mytagger", spec);
        let tagger = catalog.tagger("mytagger").unwrap();
        assert_eq!(tagger.campaigns.len(), 1);
    }

    #[test]
    fn requested_points_keep_unsupported_labels() {
        let catalog = Catalog::builtin();
        let campaign = &catalog.tagger("cmva").unwrap().campaigns[0];
        let requested = vec!["T".to_string(), "shape_corr".to_string()];
        let points: Vec<_> = campaign.requested_points(&requested).collect();
        assert_eq!(
            points,
            vec![("T", Some(OperatingPoint::Tight)), ("shape_corr", None)]
        );
    }
}
