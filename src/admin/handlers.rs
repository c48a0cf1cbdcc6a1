use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::admin::AdminState;
use crate::report::{self, ZoneSummary};
use crate::upstream::RegistryError;

fn registry_error(zone: Option<&str>, e: RegistryError) -> Response {
    tracing::error!(zone, error = %e, "Failed to describe upstream");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

/// Text status page for every zone.
pub async fn get_status(State(state): State<AdminState>) -> Response {
    match report::status_page(state.registry.as_ref(), &state.active).await {
        Ok(page) => page.into_response(),
        Err(e) => registry_error(None, e),
    }
}

/// `up` (200) or `down` (503).
pub async fn get_zone_status(
    State(state): State<AdminState>,
    Path(zone): Path<String>,
) -> Response {
    match report::zone_summary(state.registry.as_ref(), &zone).await {
        Ok(ZoneSummary::Up) => (StatusCode::OK, ZoneSummary::Up.as_str()).into_response(),
        Ok(ZoneSummary::Down) => {
            (StatusCode::SERVICE_UNAVAILABLE, ZoneSummary::Down.as_str()).into_response()
        }
        Err(e) => registry_error(Some(zone.as_str()), e),
    }
}

pub async fn get_zone_peers(
    State(state): State<AdminState>,
    Path(zone): Path<String>,
) -> Response {
    match report::zone_details(state.registry.as_ref(), &state.active, &zone).await {
        Ok(details) => Json(details).into_response(),
        Err(e) => registry_error(Some(zone.as_str()), e),
    }
}
