use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{error::AppError, services::confirmation::ConfirmTripResponse, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/trips/:trip_id/confirm", get(confirm_trip))
}

async fn confirm_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<ConfirmTripResponse>, AppError> {
    let confirmation = state.confirmation.confirm_trip(&trip_id).await?;
    Ok(Json(confirmation.into()))
}
