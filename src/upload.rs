use serde::Serialize;

use crate::error::ApiError;

/// Parsed layered node-diagram description. Field names match the upload
/// row headers so the response mirrors the file's own vocabulary.
///
/// The per-layer sequences are assumed (not validated) to match
/// `numLayers`; the client owns that invariant.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LayerDiagram {
    #[serde(rename = "numLayers")]
    pub num_layers: i64,
    #[serde(rename = "numNodes")]
    pub num_nodes: Vec<i64>,
    #[serde(rename = "layerNames")]
    pub layer_names: Vec<String>,
    #[serde(rename = "nodeLabels")]
    pub node_labels: Vec<Vec<String>>,
}

/// Parses an uploaded diagram file. Rows are headerless CSV with the first
/// field selecting what the rest of the row describes; unrecognized headers
/// are ignored. Repeated scalar/sequence rows overwrite, while each
/// `nodeLabels` row appends one layer's labels.
///
/// Blank fields are filtered out. (Upstream behavior carried a second,
/// commented-out variant that kept blanks; filtering is the active
/// contract until product says otherwise.)
pub fn parse_diagram(bytes: &[u8]) -> Result<LayerDiagram, ApiError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| ApiError::BadUpload("file is not valid UTF-8".to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut out = LayerDiagram::default();
    for record in reader.records() {
        let record = record.map_err(|e| ApiError::BadUpload(e.to_string()))?;
        let Some(header) = record.get(0) else {
            continue;
        };

        match header {
            "numLayers" => {
                let raw = record.get(1).unwrap_or("");
                out.num_layers = raw.trim().parse().map_err(|_| {
                    ApiError::BadUpload(format!("numLayers is not an integer: '{raw}'"))
                })?;
            }
            "numNodes" => {
                let mut counts = Vec::new();
                for raw in record.iter().skip(1).filter(|f| !f.is_empty()) {
                    let n = raw.trim().parse().map_err(|_| {
                        ApiError::BadUpload(format!("numNodes entry is not an integer: '{raw}'"))
                    })?;
                    counts.push(n);
                }
                out.num_nodes = counts;
            }
            "layerNames" => {
                out.layer_names = record
                    .iter()
                    .skip(1)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "nodeLabels" => {
                out.node_labels.push(
                    record
                        .iter()
                        .skip(1)
                        .filter(|f| !f.is_empty())
                        .map(str::to_string)
                        .collect(),
                );
            }
            _ => {}
        }
    }
    Ok(out)
}
