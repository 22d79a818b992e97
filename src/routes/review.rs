//! Review endpoint
//!
//! `POST /api/review` runs one literature review and streams it back as
//! Server-Sent Events:
//!
//! - `frame`: `{"source": "...", "content": "..."}` per finished agent message
//! - `error`: the error message, if a turn fails (the stream then ends)
//! - `done`: always last

use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
    Json, Router,
};
use futures::stream::{self, Stream, StreamExt};
use tracing::{info, warn};

use crate::agents::{run_review, TeamConfig};
use crate::models::{AppState, ErrorResponse, ReviewRequestBody};
use crate::types::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/review", post(start_review))
        .with_state(state)
}

fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn start_review(
    State(state): State<AppState>,
    Json(body): Json<ReviewRequestBody>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<ErrorResponse>)> {
    let request = body.into_request(&state.config);
    info!(topic = %request.topic, num_papers = request.num_papers, "Received review request");

    let frames = run_review(
        &request,
        TeamConfig::default(),
        state.llm.clone(),
        state.index.clone(),
        &state.config,
    )
    .map_err(|e| {
        warn!(error = %e, "Rejected review request");
        (status_for(&e), Json(ErrorResponse { error: e.to_string() }))
    })?;

    let events = frames
        .map(|item| match item {
            Ok(frame) => Event::default()
                .event("frame")
                .json_data(&frame)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
            Err(e) => Event::default().event("error").data(e.to_string()),
        })
        .chain(stream::once(async { Event::default().event("done").data("") }))
        .map(Ok::<_, Infallible>);

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
