use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::error::ApiError;

/// Binary cohort split encoded in every category label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeStatus {
    HasCe,
    LacksCe,
}

impl CeStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hasCE" => Some(CeStatus::HasCe),
            "lacksCE" => Some(CeStatus::LacksCe),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CeStatus::HasCe => "hasCE",
            CeStatus::LacksCe => "lacksCE",
        }
    }
}

/// Structured form of a category label, parsed once at load so request
/// handlers match on fields instead of re-scanning label substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryKey {
    pub ce_status: CeStatus,
    pub age_bin: u32,
    pub lab_item: Option<u32>,
}

impl CategoryKey {
    /// Labels look like `hasCE_AGE_yrBIN_3` (admissions) or
    /// `hasCE_AGE_yrBIN_3_item_1001` (observations).
    pub fn parse(label: &str) -> Option<Self> {
        let (ce, rest) = label.split_once("_AGE_yrBIN_")?;
        let ce_status = CeStatus::parse(ce)?;
        let (age, lab_item) = match rest.split_once("_item_") {
            Some((age, item)) => (age, Some(item.parse().ok()?)),
            None => (rest, None),
        };
        let age_bin = age.parse().ok()?;

        Some(CategoryKey {
            ce_status,
            age_bin,
            lab_item,
        })
    }
}

/// One row of the admission dataset. Serialized with the source column
/// names so `/data` can echo the raw rows back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionRow {
    pub category: String,
    #[serde(rename = "num_Unique_HADMs")]
    pub num_unique_hadms: u64,
    #[serde(skip)]
    pub key: CategoryKey,
}

/// One row of the observation dataset. `key.lab_item` is always present;
/// the loader rejects observation labels without an item id.
#[derive(Debug, Clone, Serialize)]
pub struct ObservationRow {
    pub category: String,
    #[serde(rename = "num_Assay_Obs")]
    pub num_assay_obs: u64,
    #[serde(skip)]
    pub key: CategoryKey,
}

pub fn load_admissions(path: &Path) -> Result<Vec<AdmissionRow>, ApiError> {
    let mut reader = open_reader(path)?;
    let headers = read_headers(&mut reader, path)?;
    let category_idx = header_index(&headers, "category", path)?;
    let count_idx = header_index(&headers, "num_Unique_HADMs", path)?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| malformed(path, e.to_string()))?;
        let category = field(&record, category_idx, path)?.to_string();
        let num_unique_hadms = parse_count(&record, count_idx, path)?;
        let key = CategoryKey::parse(&category)
            .ok_or_else(|| malformed(path, format!("unparseable category '{category}'")))?;

        out.push(AdmissionRow {
            category,
            num_unique_hadms,
            key,
        });
    }
    Ok(out)
}

pub fn load_observations(path: &Path) -> Result<Vec<ObservationRow>, ApiError> {
    let mut reader = open_reader(path)?;
    let headers = read_headers(&mut reader, path)?;
    let category_idx = header_index(&headers, "category", path)?;
    let count_idx = header_index(&headers, "num_Assay_Obs", path)?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| malformed(path, e.to_string()))?;
        let category = field(&record, category_idx, path)?.to_string();
        let num_assay_obs = parse_count(&record, count_idx, path)?;
        let key = CategoryKey::parse(&category)
            .filter(|k| k.lab_item.is_some())
            .ok_or_else(|| malformed(path, format!("unparseable category '{category}'")))?;

        out.push(ObservationRow {
            category,
            num_assay_obs,
            key,
        });
    }
    Ok(out)
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, ApiError> {
    let file = File::open(path).map_err(|source| ApiError::SourceUnreadable {
        path: path.display().to_string(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file))
}

fn read_headers(
    reader: &mut csv::Reader<File>,
    path: &Path,
) -> Result<csv::StringRecord, ApiError> {
    reader
        .headers()
        .map(Clone::clone)
        .map_err(|e| malformed(path, format!("cannot read headers: {e}")))
}

fn header_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize, ApiError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| malformed(path, format!("missing required column '{name}'")))
}

fn field<'a>(
    record: &'a csv::StringRecord,
    idx: usize,
    path: &Path,
) -> Result<&'a str, ApiError> {
    record
        .get(idx)
        .ok_or_else(|| malformed(path, format!("row is missing field {idx}")))
}

fn parse_count(record: &csv::StringRecord, idx: usize, path: &Path) -> Result<u64, ApiError> {
    let raw = field(record, idx, path)?;
    raw.trim()
        .parse()
        .map_err(|_| malformed(path, format!("count is not a non-negative integer: '{raw}'")))
}

fn malformed(path: &Path, detail: String) -> ApiError {
    ApiError::MalformedRow {
        path: path.display().to_string(),
        detail,
    }
}
