pub mod codec;
pub mod entry;
pub mod table;

pub use codec::{load_file, read_calibration, save_file, to_csv_string, write_calibration};
pub use entry::{is_total, variation_name, Entry, JetFlavor, OperatingPoint, Parameters};
pub use table::Calibration;
