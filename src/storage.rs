use std::path::{Path, PathBuf};

/// Fixed locations of the pre-aggregated source datasets under the data
/// directory. Nothing is ever written back; the backend only reads.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_dir: PathBuf,
    pub admissions_csv: PathBuf,
    pub observations_csv: PathBuf,
}

impl StoragePaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir: PathBuf = data_dir.into();
        let admissions_csv = data_dir.join("numHADM_perAGE-YR-bin.csv");
        let observations_csv = data_dir.join("numOBS_perAGE-YR-bin.csv");

        Self {
            data_dir,
            admissions_csv,
            observations_csv,
        }
    }
}

pub fn file_present_nonempty(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(m) => m.is_file() && m.len() > 0,
        Err(_) => false,
    }
}
