use crate::calibration::entry::{Entry, JetFlavor, OperatingPoint};

/// A tagger's calibration: the ordered entries of one CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calibration {
    tagger: String,
    entries: Vec<Entry>,
}

impl Calibration {
    pub fn new(tagger: impl Into<String>) -> Self {
        Self {
            tagger: tagger.into(),
            entries: Vec::new(),
        }
    }

    pub fn tagger(&self) -> &str {
        &self.tagger
    }

    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matching<'a>(
        &'a self,
        operating_point: OperatingPoint,
        measurement_type: &'a str,
        jet_flavor: JetFlavor,
    ) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries.iter().filter(move |entry| {
            entry.params.operating_point == operating_point
                && entry.params.measurement_type == measurement_type
                && entry.params.jet_flavor == jet_flavor
        })
    }

    /// Operating points present in the table, in first-seen order.
    pub fn operating_points(&self) -> Vec<OperatingPoint> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.params.operating_point) {
                seen.push(entry.params.operating_point);
            }
        }
        seen
    }

    /// Measurement types present for a flavour, in first-seen order.
    pub fn measurement_types(&self, jet_flavor: JetFlavor) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for entry in self
            .entries
            .iter()
            .filter(|entry| entry.params.jet_flavor == jet_flavor)
        {
            if !seen.contains(&entry.params.measurement_type) {
                seen.push(entry.params.measurement_type.clone());
            }
        }
        seen
    }
}

impl Extend<Entry> for Calibration {
    fn extend<T: IntoIterator<Item = Entry>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}
