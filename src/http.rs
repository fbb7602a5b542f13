use std::net::SocketAddr;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::catalog::{Catalog, Overview, SpeciesDetail};
use crate::domain::{EnrichedImage, ImageFilter};
use crate::error::CatalogError;
use crate::store::SqliteStore;

type SharedCatalog = Catalog<SqliteStore>;

/// Error body in the shape clients expect: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(catalog: SharedCatalog) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/all_info", get(all_info))
        .route("/api/v1/info", get(species_info))
        .route("/api/v1/table_data", get(table_data))
        .layer(CorsLayer::permissive())
        .with_state(catalog)
}

/// Bind and serve until ctrl-c.
pub async fn serve(addr: SocketAddr, catalog: SharedCatalog) -> Result<(), CatalogError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| CatalogError::Http(err.to_string()))?;
    info!(%addr, "catalog API listening");

    axum::serve(listener, router(catalog))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| CatalogError::Http(err.to_string()))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => error!(error = %err, "failed to listen for shutdown signal"),
    }
}

fn into_api_error(err: CatalogError) -> ApiError {
    match &err {
        CatalogError::UnknownName { dimension, name } => {
            info!(%dimension, name = %name, "filter name did not resolve");
            (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    detail: dimension.not_found_detail().to_string(),
                }),
            )
        }
        _ => {
            error!(error = %err, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    detail: "Internal Server Error".to_string(),
                }),
            )
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn all_info(State(catalog): State<SharedCatalog>) -> Result<Json<Overview>, ApiError> {
    catalog.overview().map(Json).map_err(into_api_error)
}

#[derive(Debug, Deserialize)]
struct SpeciesInfoParams {
    species_name: String,
}

async fn species_info(
    State(catalog): State<SharedCatalog>,
    Query(params): Query<SpeciesInfoParams>,
) -> Result<Json<SpeciesDetail>, ApiError> {
    catalog
        .species_detail(&params.species_name)
        .map(Json)
        .map_err(into_api_error)
}

#[derive(Debug, Serialize)]
struct TableData {
    results: Vec<EnrichedImage>,
}

async fn table_data(
    State(catalog): State<SharedCatalog>,
    Query(filter): Query<ImageFilter>,
) -> Result<Json<TableData>, ApiError> {
    let filter = filter.normalized();
    catalog
        .search_images(&filter)
        .map(|results| Json(TableData { results }))
        .map_err(into_api_error)
}
