//! File lifecycle handlers.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use base64::Engine;
use cabinet_core::{FileStatus, ObjectKey};
use cabinet_metadata::models::{FileRow, NewFile};
use cabinet_storage::UrlMethod;
use serde::{Deserialize, Serialize};

const MIN_FILE_NAME_LENGTH: usize = 1;
const MAX_FILE_NAME_LENGTH: usize = 127;

const MIN_CHECKSUM_LENGTH: usize = 3;
const MAX_CHECKSUM_LENGTH: usize = 25;

/// POST /api/v1/files request payload.
#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    pub tenant_id: String,
    pub device_id: String,
    pub name: String,
    pub checksum: String,
    pub size: i64,
}

/// File payload returned by the API.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    #[serde(flatten)]
    pub file: FileRow,
    /// Pre-signed URL, present where the operation grants storage access.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_url: Option<String>,
}

/// GET /api/internal/v1/files response payload.
#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    pub files: Vec<FileRow>,
    pub count: i64,
}

/// GET .../signed_url response payload.
#[derive(Debug, Serialize)]
pub struct SignedUrlResponse {
    pub file_name: String,
    pub signed_url: String,
}

fn is_valid_uuid(s: &str) -> bool {
    uuid::Uuid::parse_str(s).is_ok()
}

fn is_valid_file_name(name: &str) -> bool {
    (MIN_FILE_NAME_LENGTH..=MAX_FILE_NAME_LENGTH).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        && !name.starts_with('.')
}

fn is_valid_checksum(checksum: &str) -> bool {
    (MIN_CHECKSUM_LENGTH..=MAX_CHECKSUM_LENGTH).contains(&checksum.len())
        && base64::engine::general_purpose::STANDARD
            .decode(checksum)
            .is_ok()
}

fn validate_create_request(request: &CreateFileRequest) -> Result<(), &'static str> {
    if request.size < 1 {
        return Err("size must be positive");
    }
    if !is_valid_uuid(&request.tenant_id) {
        return Err("tenant_id must be a UUID");
    }
    if !is_valid_uuid(&request.device_id) {
        return Err("device_id must be a UUID");
    }
    if !is_valid_file_name(&request.name) {
        return Err("invalid file name");
    }
    if !is_valid_checksum(&request.checksum) {
        return Err("checksum must be base64");
    }
    Ok(())
}

/// POST /api/v1/files - create a file row and return it together with a
/// pre-signed upload URL.
pub async fn create_file(
    State(state): State<AppState>,
    Json(request): Json<CreateFileRequest>,
) -> ApiResult<(StatusCode, Json<FileResponse>)> {
    if let Err(reason) = validate_create_request(&request) {
        tracing::info!(reason, "Rejecting create file request");
        return Err(ApiError::BadRequest(reason.to_string()));
    }

    let new_file = NewFile {
        tenant_id: request.tenant_id,
        device_id: request.device_id,
        name: request.name,
        checksum: request.checksum,
        size: request.size,
        // Assign the next bucket in the rotation.
        bucket_name: state.buckets.next(),
    };

    let file = state.files.create(&new_file).await?;
    metrics::FILES_CREATED.inc();

    // The client uploads directly to storage with this URL; the storage
    // layer's object-written notification later flips the status.
    let key = ObjectKey::new(&file.tenant_id, &file.device_id, file.file_id);
    let signed_url = state
        .storage
        .signed_url(&file.bucket_name, &key, UrlMethod::Put)
        .await?;
    metrics::SIGNED_URLS_ISSUED.inc();

    Ok((
        StatusCode::CREATED,
        Json(FileResponse {
            file,
            signed_url: Some(signed_url),
        }),
    ))
}

/// GET /api/v1/files/{id} - fetch a file by identity.
pub async fn get_file(
    State(state): State<AppState>,
    Path(file_id): Path<i64>,
) -> ApiResult<Json<FileResponse>> {
    let file = state.files.get(file_id).await?.ok_or_else(|| {
        metrics::FILE_NOT_FOUND_ERRORS.inc();
        ApiError::NotFound(format!("file {file_id}"))
    })?;

    metrics::FILES_RETRIEVED.inc();
    Ok(Json(FileResponse {
        file,
        signed_url: None,
    }))
}

/// Query parameters for the internal file listing.
#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    pub tenant_id: String,
    pub device_id: String,
}

/// GET /api/internal/v1/files - list files for one tenant/device pair.
pub async fn list_files(
    State(state): State<AppState>,
    Query(params): Query<ListFilesParams>,
) -> ApiResult<Json<ListFilesResponse>> {
    let files = state.files.list(&params.tenant_id, &params.device_id).await?;
    let count = files.len() as i64;
    Ok(Json(ListFilesResponse { files, count }))
}

/// DELETE /api/internal/v1/files/{id} - remove a file row.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.files.delete(file_id).await?;
    metrics::FILES_DELETED.inc();
    Ok(StatusCode::NO_CONTENT)
}

/// Query parameters for signed URL requests.
#[derive(Debug, Deserialize)]
pub struct SignedUrlParams {
    pub method: String,
}

/// GET /api/internal/v1/files/{id}/signed_url - pre-sign an operation on an
/// existing file's storage object.
pub async fn get_signed_url(
    State(state): State<AppState>,
    Path(file_id): Path<i64>,
    Query(params): Query<SignedUrlParams>,
) -> ApiResult<Json<SignedUrlResponse>> {
    let method = UrlMethod::parse(&params.method)?;

    let file = state.files.get(file_id).await?.ok_or_else(|| {
        metrics::FILE_NOT_FOUND_ERRORS.inc();
        ApiError::NotFound(format!("file {file_id}"))
    })?;

    // Quarantined files must not be reachable through fresh URLs.
    if file.status == FileStatus::Quarantined.as_str() {
        metrics::SIGNED_URLS_FORBIDDEN.inc();
        return Err(ApiError::Forbidden(format!("file {file_id} is quarantined")));
    }

    let key = ObjectKey::new(&file.tenant_id, &file.device_id, file.file_id);
    let signed_url = state
        .storage
        .signed_url(&file.bucket_name, &key, method)
        .await?;
    metrics::SIGNED_URLS_ISSUED.inc();

    Ok(Json(SignedUrlResponse {
        file_name: file.name,
        signed_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_validation() {
        assert!(is_valid_file_name("report-2024_v1.pdf"));
        assert!(is_valid_file_name("a"));
        assert!(!is_valid_file_name(""));
        assert!(!is_valid_file_name(&"x".repeat(128)));
        assert!(!is_valid_file_name(".hidden"));
        assert!(!is_valid_file_name("../escape"));
        assert!(!is_valid_file_name("na/me"));
    }

    #[test]
    fn checksum_validation() {
        assert!(is_valid_checksum("AAAA"));
        assert!(is_valid_checksum("QUFBQQ=="));
        assert!(!is_valid_checksum("no"));
        assert!(!is_valid_checksum("!!!!"));
        assert!(!is_valid_checksum(&"A".repeat(28)));
    }
}
