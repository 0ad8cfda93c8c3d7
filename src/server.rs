use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use axum::extract::{Multipart, Path as AxumPath, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::cli::ServeArgs;
use crate::dataset::{self, AdmissionRow, ObservationRow};
use crate::error::ApiError;
use crate::storage::{StoragePaths, file_present_nonempty};
use crate::tree::{self, TreeNode};
use crate::upload;

#[derive(Clone)]
pub struct AppState {
    paths: Arc<StoragePaths>,
}

impl AppState {
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths: Arc::new(paths),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/data", get(api_data))
        .route("/expand/:node_type/:node_id", get(api_expand))
        .route("/upload", post(api_upload))
        .layer(cors)
        .with_state(state)
}

pub async fn run(opts: ServeArgs) -> anyhow::Result<()> {
    let paths = StoragePaths::new(&opts.data_dir);
    if !file_present_nonempty(&paths.admissions_csv) {
        return Err(anyhow!(
            "admission dataset not found at {}",
            paths.admissions_csv.display()
        ));
    }
    if !file_present_nonempty(&paths.observations_csv) {
        return Err(anyhow!(
            "observation dataset not found at {}",
            paths.observations_csv.display()
        ));
    }

    let app = build_router(AppState::new(paths));

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct DataResponse {
    nodes: Vec<TreeNode>,
    /// Raw source rows, echoed so the client can filter locally.
    hadm_data: Vec<AdmissionRow>,
    obs_data: Vec<ObservationRow>,
}

async fn api_data(State(st): State<AppState>) -> Result<Json<DataResponse>, ApiError> {
    let hadm = dataset::load_admissions(&st.paths.admissions_csv)?;
    let obs = dataset::load_observations(&st.paths.observations_csv)?;

    let root = tree::build_root(&hadm, &obs);
    Ok(Json(DataResponse {
        nodes: vec![root],
        hadm_data: hadm,
        obs_data: obs,
    }))
}

#[derive(Debug, Serialize)]
struct ExpandResponse {
    children: Vec<TreeNode>,
}

async fn api_expand(
    State(st): State<AppState>,
    AxumPath((node_type, node_id)): AxumPath<(String, String)>,
) -> Result<Json<ExpandResponse>, ApiError> {
    let children = match node_type.as_str() {
        "ce_status" => {
            let hadm = dataset::load_admissions(&st.paths.admissions_csv)?;
            tree::expand_ce_status(&node_id, &hadm)?
        }
        "age_bin" => {
            let obs = dataset::load_observations(&st.paths.observations_csv)?;
            tree::expand_age_bin(&node_id, &obs)?
        }
        other => return Err(ApiError::UnsupportedNodeType(other.to_string())),
    };
    Ok(Json(ExpandResponse { children }))
}

/// Missing-file cases keep the upstream contract: a 200 response whose body
/// is `{"error": ...}`, left for the caller to inspect. Malformed content
/// is a proper 400 via `ApiError`.
async fn api_upload(mut multipart: Multipart) -> Result<Response, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadUpload(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        if field.file_name().map(str::trim).unwrap_or("").is_empty() {
            return Ok(Json(json!({ "error": "No selected file" })).into_response());
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadUpload(e.to_string()))?;
        let diagram = upload::parse_diagram(&bytes)?;
        return Ok(Json(diagram).into_response());
    }

    Ok(Json(json!({ "error": "No file part" })).into_response())
}
