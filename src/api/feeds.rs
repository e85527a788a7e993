//! Feed lookup endpoint

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::AppState;
use crate::api::FeedResponse;
use crate::error::AppError;

/// GET /feeds/:id
///
/// Serves the feed from the local cache when fresh, otherwise fetches
/// it upstream first. The retention prune spawned by the service keeps
/// running after the response is sent; its handle is dropped here.
async fn get_feed(
    State(state): State<AppState>,
    Path(feed_id): Path<String>,
) -> Result<Json<FeedResponse>, AppError> {
    tracing::info!(feed_id, "Feed lookup");

    let lookup = state.service.get_feed(&feed_id).await?;
    drop(lookup.prune);

    Ok(Json(lookup.feed))
}

/// Create the feeds router
pub fn feeds_router() -> Router<AppState> {
    Router::new().route("/feeds/:id", get(get_feed))
}
