use std::sync::Arc;

use crate::db::{
    CreateSavedQuery, SavedQuery, SavedQueryPermissionRepository, SavedQueryRepository, User,
    VisibilityFilter,
};
use crate::error::{AppError, AppResult};
use crate::AppState;

const MAX_NAME_LEN: usize = 255;

pub struct SavedQueryService;

impl SavedQueryService {
    pub async fn create(
        state: &Arc<AppState>,
        user: &User,
        data: CreateSavedQuery,
    ) -> AppResult<SavedQuery> {
        let data = validate(data)?;
        let query = SavedQueryRepository::create(&state.db, &user.id, data).await?;

        tracing::info!("User {} created saved query {}", user.id, query.id);
        Ok(query)
    }

    /// Fetch a saved query the user may read: owner, administrator, grantee,
    /// or anyone when it is public.
    pub async fn get_visible(
        state: &Arc<AppState>,
        user: &User,
        query_id: i64,
    ) -> AppResult<SavedQuery> {
        let query = find_or_not_found(state, query_id).await?;

        if query.user_id == user.id || user.is_admin {
            return Ok(query);
        }

        let grants = SavedQueryPermissionRepository::list_for_query(&state.db, query_id).await?;
        let visible = grants
            .iter()
            .any(|g| g.public || g.shared_to_user_id.as_deref() == Some(user.id.as_str()));

        if visible {
            Ok(query)
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub async fn list(
        state: &Arc<AppState>,
        user: &User,
        filter: VisibilityFilter,
    ) -> AppResult<Vec<SavedQuery>> {
        SavedQueryRepository::list_visible(&state.db, &user.id, filter).await
    }

    pub async fn delete(state: &Arc<AppState>, user: &User, query_id: i64) -> AppResult<()> {
        let query = find_or_not_found(state, query_id).await?;

        if query.user_id != user.id && !user.is_admin {
            tracing::warn!(
                "User {} tried to delete saved query {} owned by {}",
                user.id,
                query_id,
                query.user_id
            );
            return Err(AppError::Forbidden);
        }

        SavedQueryRepository::delete(&state.db, query_id).await?;
        tracing::info!("User {} deleted saved query {}", user.id, query_id);
        Ok(())
    }
}

async fn find_or_not_found(state: &Arc<AppState>, query_id: i64) -> AppResult<SavedQuery> {
    SavedQueryRepository::find_by_id(&state.db, query_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Saved query not found".to_string()))
}

fn validate(mut data: CreateSavedQuery) -> AppResult<CreateSavedQuery> {
    data.name = data.name.trim().to_string();

    if data.name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    if data.name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    if data.query.trim().is_empty() {
        return Err(AppError::Validation("query must not be empty".to_string()));
    }

    Ok(data)
}
