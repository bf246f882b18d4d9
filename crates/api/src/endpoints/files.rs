//! File serving and admin uploads.

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use owr_common::{AppError, AppResult, Bucket, UploadedFile};
use owr_core::FileSignature;
use serde::Deserialize;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// A file read from a multipart body.
#[derive(Debug)]
pub struct FilePart {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Read the `file` field of a multipart body. Other fields are ignored.
pub async fn read_file_part(multipart: &mut Multipart) -> AppResult<FilePart> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .to_vec();
        return Ok(FilePart { file_name, data });
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

/// Signature query for private files.
#[derive(Debug, Default, Deserialize)]
pub struct SignatureQuery {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

/// Serve a stored file.
async fn serve_file(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<SignatureQuery>,
) -> AppResult<Response> {
    let bucket: Bucket = bucket.parse()?;
    let file = state
        .storage_service
        .serve(
            bucket,
            &key,
            FileSignature {
                expires: query.expires,
                signature: query.signature,
            },
        )
        .await?;

    let cache = if bucket.is_public() {
        "public, max-age=86400"
    } else {
        "private, no-store"
    };

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CACHE_CONTROL, cache),
        ],
        file.data,
    )
        .into_response())
}

/// Upload a file to a bucket.
async fn upload_file(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadedFile>> {
    let bucket: Bucket = bucket.parse()?;
    let part = read_file_part(&mut multipart).await?;

    let uploaded = state
        .storage_service
        .upload(bucket, &part.file_name, &part.data)
        .await?;

    tracing::debug!(admin_id = %admin.id, bucket = %bucket, key = %uploaded.key, "Admin upload");
    Ok(ApiResponse::created(uploaded))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{bucket}/{*key}", get(serve_file))
}

pub fn admin_router() -> Router<AppState> {
    Router::new().route("/files/{bucket}", post(upload_file))
}
