use crate::calibration::entry::Entry;
use crate::calibration::table::Calibration;
use crate::prelude::{CalibrationError, CalibrationResult};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

const HEADER_MARKER: &str = "OperatingPoint";

pub const CSV_HEADER: &str = "OperatingPoint, measurementType, sysType, jetFlavor, etaMin, etaMax, ptMin, ptMax, discrMin, discrMax, formula \n";

/// Reads a calibration table in the BTagCalibration CSV format.
///
/// Lines are split on every comma, so formulas cannot contain commas. The
/// tagger name is taken from the header (`tagger;OperatingPoint, ...`) when
/// one is present, otherwise `fallback_tagger` is used.
pub fn read_calibration<R: Read>(reader: R, fallback_tagger: &str) -> CalibrationResult<Calibration> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut tagger: Option<String> = None;
    let mut entries = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);
        let tokens: Vec<&str> = record.iter().collect();
        if tokens.iter().all(|token| token.is_empty()) {
            continue;
        }
        if tokens.iter().any(|token| token.contains(HEADER_MARKER)) {
            if let Some((name, _)) = tokens[0].split_once(';') {
                if tagger.is_none() && !name.trim().is_empty() {
                    tagger = Some(name.trim().to_string());
                }
            }
            continue;
        }
        entries.push(Entry::from_tokens(&tokens, line)?);
    }

    let mut calibration = Calibration::new(tagger.unwrap_or_else(|| fallback_tagger.to_string()));
    calibration.extend(entries);
    Ok(calibration)
}

/// Loads a calibration file, naming the tagger after the file when the
/// header carries no name.
pub fn load_file<P: AsRef<Path>>(path: P) -> CalibrationResult<Calibration> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let calibration = read_calibration(BufReader::new(file), &tagger_from_path(path))?;
    debug!(
        "loaded {} entries for tagger {} from {}",
        calibration.len(),
        calibration.tagger(),
        path.display()
    );
    Ok(calibration)
}

/// First `_`-separated token of the file name (`DeepCSV_2018.csv` -> `DeepCSV`).
pub fn tagger_from_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('_').next().map(str::to_string))
        .map(|name| name.trim_end_matches(".csv").to_string())
        .unwrap_or_default()
}

pub fn write_calibration<W: Write>(calibration: &Calibration, mut writer: W) -> CalibrationResult<()> {
    writer.write_all(to_csv_string(calibration).as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn to_csv_string(calibration: &Calibration) -> String {
    let mut out = format!("{};{}", calibration.tagger(), CSV_HEADER);
    for entry in calibration.entries() {
        out.push_str(&entry.to_csv_line());
    }
    out
}

pub fn save_file<P: AsRef<Path>>(calibration: &Calibration, path: P) -> CalibrationResult<()> {
    let file = File::create(path.as_ref()).map_err(CalibrationError::Io)?;
    write_calibration(calibration, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::entry::{JetFlavor, OperatingPoint};
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "DeepCSV;OperatingPoint, measurementType, sysType, jetFlavor, etaMin, etaMax, ptMin, ptMax, discrMin, discrMax, formula \n\
1, comb, central, 0, 0, 2.4, 20, 30, 0, 1, \"0.9*((1.+(0.01*x))/(1.+(0.02*x)))\" \n\
\n\
1, comb, up, 0, 0, 2.4, 20, 30, 0, 1, \"0.9*((1.+(0.01*x))/(1.+(0.02*x)))+0.05\" \n";

    #[test]
    fn reader_takes_tagger_from_header_and_skips_blank_lines() {
        let calib = read_calibration(SAMPLE.as_bytes(), "fallback").unwrap();
        assert_eq!(calib.tagger(), "DeepCSV");
        assert_eq!(calib.len(), 2);
        assert_eq!(calib.entries()[1].params.sys_type, "up");
        assert_eq!(calib.entries()[0].params.operating_point, OperatingPoint::Medium);
        assert_eq!(calib.entries()[0].params.jet_flavor, JetFlavor::B);
    }

    #[test]
    fn reader_reports_line_of_malformed_entry() {
        let text = "1, comb, central, 0, 0, 2.4, 20, 30, 0, 1, \"1.0\" \n7, comb, central, 0, 0, 2.4, 20, 30, 0, 1, \"1.0\" \n";
        let err = read_calibration(text.as_bytes(), "t").unwrap_err();
        match err {
            CalibrationError::InvalidLine { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn empty_field_makes_line_invalid() {
        for text in [
            "1, comb, central, 0, 0, 2.4, 20, 30, 0, 1, \"1.0\", \n",
            "1, comb, , central, 0, 0, 2.4, 20, 30, 0, 1, \"1.0\" \n",
            "1, comb, central, 0, 0, 2.4, 20, 30, 0, , \"1.0\" \n",
            "1, , central, 0, 0, 2.4, 20, 30, 0, 1, \"1.0\" \n",
        ] {
            let err = read_calibration(text.as_bytes(), "t").unwrap_err();
            assert!(matches!(err, CalibrationError::InvalidLine { line: 1, .. }), "{text}");
        }
    }

    #[test]
    fn written_table_reads_back_identically() {
        let calib = read_calibration(SAMPLE.as_bytes(), "fallback").unwrap();
        let text = to_csv_string(&calib);
        assert!(text.starts_with("DeepCSV;OperatingPoint, measurementType"));
        let again = read_calibration(text.as_bytes(), "other").unwrap();
        assert_eq!(again, calib);
    }

    #[test]
    fn load_file_falls_back_to_file_name_tagger() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"0, incl, central, 2, 0, 2.4, 20, 1000, 0, 1, \"1.1\" \n")
            .unwrap();
        let calib = load_file(temp.path()).unwrap();
        assert_eq!(calib.len(), 1);
        assert_eq!(calib.tagger(), tagger_from_path(temp.path()));
    }

    #[test]
    fn tagger_from_path_uses_first_token() {
        assert_eq!(tagger_from_path(Path::new("a/DeepJet_102XSF_V1.csv")), "DeepJet");
        assert_eq!(tagger_from_path(Path::new("custom.csv")), "custom");
    }
}
