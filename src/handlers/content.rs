use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::content::{Layout, Profile, Widget};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutQuery {
    // only the literal "true" turns it on
    include_hidden: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetsQuery {
    layout_id: Option<String>,
}

// GET /api/profile
pub async fn profile_handler(State(state): State<Arc<AppState>>) -> Result<Json<Profile>, AppError> {
    state
        .content
        .profile(&state.normalizer)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))
}

// GET /api/layout?includeHidden=true
pub async fn layout_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LayoutQuery>,
) -> Json<Layout> {
    let include_hidden = query.include_hidden.as_deref() == Some("true");
    Json(state.content.active_layout(&state.normalizer, include_hidden))
}

// GET /api/widgets?layoutId=1
pub async fn widgets_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WidgetsQuery>,
) -> Result<Json<Vec<Widget>>, AppError> {
    let layout_id = query
        .layout_id
        .as_deref()
        .and_then(|id| id.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::BadRequest("layoutId must be a number".into()))?;

    state
        .content
        .widgets(&state.normalizer, layout_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Layout {layout_id} not found")))
}
