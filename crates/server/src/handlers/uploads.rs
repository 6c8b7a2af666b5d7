//! Upload handlers.

use crate::error::{ApiError, ApiResult, UploadError};
use crate::metrics::record_upload;
use crate::state::AppState;
use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use sqldepot_storage::boxed_stream;
use std::error::Error as _;

/// Successful upload response.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
enum UploadKind {
    Database,
    Sql,
}

impl UploadKind {
    fn endpoint(self) -> &'static str {
        match self {
            UploadKind::Database => "database",
            UploadKind::Sql => "sql",
        }
    }
}

/// POST /api/upload/ - Store an uploaded SQLite database.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_database(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    handle_upload(&state, UploadKind::Database, multipart).await
}

/// POST /api/upload/sql - Store an uploaded SQL script and build a database from it.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_sql(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    handle_upload(&state, UploadKind::Sql, multipart).await
}

/// Feed the first file part of the form to the uploader.
///
/// Parts without a file name (plain form fields) are skipped. Parts after
/// the file are never read.
async fn handle_upload(
    state: &AppState,
    kind: UploadKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| {
        record_upload(kind.endpoint(), "bad_request");
        ApiError::BadRequest(format!("expected a multipart form: {e}"))
    })?;

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            record_upload(kind.endpoint(), "bad_request");
            ApiError::BadRequest(format!("failed to read upload: {e}"))
        })?;

        let Some(field) = field else {
            record_upload(kind.endpoint(), "bad_request");
            return Err(ApiError::BadRequest(
                "no file uploaded, send the file as a multipart part with a file name".to_string(),
            ));
        };

        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = boxed_stream(field.map_err(std::io::Error::other));

        let message = match kind {
            UploadKind::Database => state
                .uploader
                .upload_database(&file_name, data)
                .await
                .map(|stored| {
                    format!(
                        "Successfully uploaded {} to {}",
                        file_name,
                        stored.database_file.display()
                    )
                }),
            UploadKind::Sql => state
                .uploader
                .upload_sql(&file_name, data)
                .await
                .map(|built| {
                    format!(
                        "Successfully uploaded {} to {} and {} to {}",
                        file_name,
                        built.sql_file.display(),
                        built.database_name,
                        built.database_file.display()
                    )
                }),
        };

        return match message {
            Ok(message) => {
                record_upload(kind.endpoint(), "ok");
                Ok(Json(UploadResponse { message }))
            }
            Err(e) => {
                record_upload(kind.endpoint(), e.code());
                log_upload_error(kind, &file_name, &e);
                Err(e.into())
            }
        };
    }
}

fn log_upload_error(kind: UploadKind, file_name: &str, e: &UploadError) {
    let cause = e.source().map(|s| s.to_string());
    match e {
        UploadError::InvalidIdentifier(_) | UploadError::Collision(_) => tracing::info!(
            endpoint = kind.endpoint(),
            file_name,
            error = %e,
            "Upload rejected"
        ),
        _ => tracing::error!(
            endpoint = kind.endpoint(),
            file_name,
            error = %e,
            cause = ?cause,
            "Upload failed"
        ),
    }
}
