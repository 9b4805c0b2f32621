//! Post handlers.
//!
//! Each handler makes one repository call per step and maps the outcome to
//! a single response; failures go through [`ApiError`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::model::{Message, Post, UpdateSummary};
use crate::repository::PostFilter;

/// `GET /posts`
pub async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.repository.get_all().await?;
    tracing::debug!(count = posts.len(), "Listed posts");
    Ok(Json(posts))
}

/// `GET /posts/{id}`
///
/// A missing post is not an error: the body is `null` with status 200.
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Post>>, ApiError> {
    let post = state.repository.get_one(&id).await?;
    tracing::debug!(id = %id, found = post.is_some(), "Fetched post");
    Ok(Json(post))
}

/// `POST /posts`
pub async fn insert_one(
    State(state): State<AppState>,
    payload: Result<Json<Post>, JsonRejection>,
) -> Result<(StatusCode, Json<Message<String>>), ApiError> {
    let Json(post) = payload?;
    let id = state.repository.insert_one(post).await?;
    tracing::debug!(id = %id, "Created post");
    Ok((StatusCode::CREATED, Json(Message::success(id))))
}

/// `PUT|PATCH /posts/{id}`
pub async fn update_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Post>, JsonRejection>,
) -> Result<Json<Message<UpdateSummary>>, ApiError> {
    let Json(post) = payload?;
    let summary = state.repository.update_one(&id, post).await?;
    tracing::debug!(
        id = %id,
        matched = summary.matched_count,
        modified = summary.modified_count,
        "Updated post"
    );
    Ok(Json(Message::success(summary)))
}

/// `PUT|PATCH /posts`
///
/// Every item must name an existing post before anything is written. The
/// check and the writes are separate repository calls, so a post deleted
/// concurrently between the two phases is not detected: its update simply
/// matches nothing. A failure during the write phase leaves the earlier
/// items updated.
pub async fn update_many(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Post>>, JsonRejection>,
) -> Result<Json<Message<String>>, ApiError> {
    let Json(items) = payload?;

    let mut ids = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let id = item.id().ok_or(ApiError::MissingId { index })?.to_string();
        if state.repository.count(&PostFilter::ById(id.clone())).await? == 0 {
            return Err(ApiError::DocumentNotFound { id });
        }
        ids.push(id);
    }

    for (id, item) in ids.iter().zip(items) {
        state.repository.update_one(id, item).await?;
    }

    tracing::debug!(count = ids.len(), "Bulk updated posts");
    Ok(Json(Message::success(String::new())))
}

/// `DELETE /posts/{id}`
///
/// Deleting a post that does not exist succeeds as a no-op.
pub async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message<String>>, ApiError> {
    let deleted = state.repository.delete_one(&id).await?;
    tracing::debug!(id = %id, deleted, "Deleted post");
    Ok(Json(Message::success(String::new())))
}

/// `GET /health`
pub async fn health() -> Json<Message<&'static str>> {
    Json(Message::success("ok"))
}
