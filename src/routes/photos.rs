use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;

use crate::auth::{authorize, ensure_can_view, Action, Caller};
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field carrying the image.
pub const PHOTO_FIELD: &str = "photo";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/photos", post(upload_photo))
        .route(
            "/users/{user_id}/photos/{photo_id}",
            get(get_photo).delete(delete_photo),
        )
}

async fn upload_photo(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<String>)> {
    authorize(&caller, Action::UploadPhoto(&user_id))?;
    {
        let conn = state.db.get()?;
        if !users::exists(&conn, &user_id)? {
            return Err(AppError::NotFound("User".into()));
        }
    }

    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let data = read_photo_field(&mut multipart).await?;
    let photo_id = state.photos.save(&user_id, &data).await?;
    Ok((StatusCode::CREATED, Json(photo_id)))
}

async fn read_photo_field(multipart: &mut Multipart) -> AppResult<Bytes> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if data.is_empty() {
            return Err(AppError::BadRequest("Photo is empty".into()));
        }
        return Ok(data);
    }
    Err(AppError::BadRequest(format!(
        "Missing '{}' field",
        PHOTO_FIELD
    )))
}

async fn get_photo(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, photo_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    {
        let conn = state.db.get()?;
        ensure_can_view(&conn, &user_id, &caller)?;
    }
    let data = state.photos.get(&user_id, &photo_id).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], data))
}

async fn delete_photo(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, photo_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::DeletePhoto(&user_id))?;
    state.photos.delete(&user_id, &photo_id).await?;
    Ok(StatusCode::OK)
}
