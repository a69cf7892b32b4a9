use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::{CreateSavedQuery, SavedQuery, VisibilityFilter};
use crate::error::{AppError, AppResult};
use crate::routes::auth::AuthUser;
use crate::services::saved_queries::SavedQueryService;
use crate::services::sharing::{SharingService, SharingSummary};
use crate::sharing::{Transition, TransitionRequest, UnshareRequest};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_saved_queries).post(create_saved_query))
        .route("/:id", get(get_saved_query).delete(delete_saved_query))
        .route(
            "/:id/permissions",
            get(get_permissions)
                .put(update_permissions)
                .delete(delete_permissions),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSavedQueryRequest {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListSavedQueriesQuery {
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionsRequest {
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeletePermissionsRequest {
    #[serde(default)]
    pub user_ids: Vec<String>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Saved query ids are positive integers; anything else never reaches storage.
fn parse_query_id(raw: &str) -> AppResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!("Invalid saved query id: {}", raw))),
    }
}

fn parse_filter(raw: Option<&str>) -> AppResult<VisibilityFilter> {
    match raw.unwrap_or("all") {
        "owned" => Ok(VisibilityFilter::Owned),
        "shared" => Ok(VisibilityFilter::SharedWithMe),
        "public" => Ok(VisibilityFilter::Public),
        "all" => Ok(VisibilityFilter::All),
        other => Err(AppError::BadRequest(format!("Unknown scope: {}", other))),
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn create_saved_query(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateSavedQueryRequest>,
) -> AppResult<(StatusCode, Json<SavedQuery>)> {
    let query = SavedQueryService::create(
        &state,
        &user,
        CreateSavedQuery {
            name: body.name,
            query: body.query,
            description: body.description.unwrap_or_default(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(query)))
}

/// List saved queries visible to the current user
async fn list_saved_queries(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListSavedQueriesQuery>,
) -> AppResult<Json<Vec<SavedQuery>>> {
    let filter = parse_filter(query.scope.as_deref())?;
    let queries = SavedQueryService::list(&state, &user, filter).await?;
    Ok(Json(queries))
}

async fn get_saved_query(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<SavedQuery>> {
    let id = parse_query_id(&id)?;
    let query = SavedQueryService::get_visible(&state, &user, id).await?;
    Ok(Json(query))
}

async fn delete_saved_query(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_query_id(&id)?;
    SavedQueryService::delete(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_permissions(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<SharingSummary>> {
    let id = parse_query_id(&id)?;
    let summary = SharingService::summary(&state, &user, id).await?;
    Ok(Json(summary))
}

/// Change the sharing scope. 201 with the grants when access was created or
/// expanded, 204 when nothing changed or access was removed.
async fn update_permissions(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdatePermissionsRequest>,
) -> AppResult<Response> {
    let id = parse_query_id(&id)?;
    let request = TransitionRequest::new(body.user_ids, body.public)?;

    match SharingService::share(&state, &user, id, request).await? {
        Transition::Granted(grants) => Ok((StatusCode::CREATED, Json(grants)).into_response()),
        Transition::Unchanged | Transition::Revoked => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn delete_permissions(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<DeletePermissionsRequest>,
) -> AppResult<StatusCode> {
    let id = parse_query_id(&id)?;
    let request = UnshareRequest::new(body.user_ids)?;

    SharingService::unshare(&state, &user, id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}
