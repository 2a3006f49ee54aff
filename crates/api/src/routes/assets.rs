//! Asset registry routes (admin).

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::asset::{ListAssetsQuery, ListAssetsResponse};
use domain::models::playlist::ContentRemovalResponse;
use domain::models::{Asset, AssetType, NewAsset};
use persistence::repositories::AssetRepository;
use shared::ids::{prefixed_id, slugify};
use tracing::{info, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_asset_uploaded;

const MAX_DISPLAY_NAME_LEN: usize = 200;

/// GET /api/v1/admin/assets?includeTiles=false
pub async fn list_assets(
    State(state): State<AppState>,
    Query(query): Query<ListAssetsQuery>,
) -> Result<Json<ListAssetsResponse>, ApiError> {
    let data: Vec<Asset> = AssetRepository::new(state.pool.clone())
        .list(query.include_tiles)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let count = data.len();

    Ok(Json(ListAssetsResponse { data, count }))
}

/// A file part read from the upload form.
struct UploadedFile {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Splits `photo.final.PNG` into (`photo.final`, `.png`).
fn split_filename(filename: &str) -> (&str, String) {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => (&filename[..dot], filename[dot..].to_ascii_lowercase()),
        _ => (filename, String::new()),
    }
}

/// Resolves the media type of an upload from its declared content type,
/// falling back to the file extension.
fn classify_upload(filename: &str, declared: Option<&str>) -> Result<(AssetType, String), ApiError> {
    let content_type = declared
        .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

    AssetType::from_content_type(&content_type)
        .map(|asset_type| (asset_type, content_type.clone()))
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "Unsupported file type '{}'. Upload an image or a video",
                content_type
            ))
        })
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::Validation(format!("Invalid multipart body: {}", err))
}

/// Upload a media file.
///
/// POST /api/v1/admin/assets (multipart: `file`, optional `displayName`)
pub async fn upload_asset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Asset>), ApiError> {
    let mut file: Option<UploadedFile> = None;
    let mut display_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| "upload".to_string());
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    content_type: content_type.unwrap_or_default(),
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("displayName") => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if text.chars().count() > MAX_DISPLAY_NAME_LEN {
                    return Err(ApiError::Validation(format!(
                        "Display name must be at most {} characters",
                        MAX_DISPLAY_NAME_LEN
                    )));
                }
                if !text.is_empty() {
                    display_name = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::Validation("No file provided".to_string()))?;
    if file.bytes.is_empty() {
        return Err(ApiError::Validation("Uploaded file is empty".to_string()));
    }

    let (asset_type, content_type) =
        classify_upload(&file.filename, Some(file.content_type.as_str()))?;
    let (stem, extension) = split_filename(&file.filename);
    let slug = slugify(stem);
    let asset_id = prefixed_id(&slug);
    let size = file.bytes.len() as i64;

    let blob = state
        .blobs
        .put(
            &format!("uploads/{}{}", slug, extension),
            file.bytes,
            &content_type,
        )
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let new_asset = NewAsset {
        asset_id,
        filename: file.filename,
        display_name,
        asset_type,
        size,
        url: blob.url.clone(),
    };

    let asset = match AssetRepository::new(state.pool.clone()).create(&new_asset).await {
        Ok(asset) => asset,
        Err(e) => {
            if let Err(delete_err) = state.blobs.delete(&blob.url).await {
                warn!(url = %blob.url, error = %delete_err, "Failed to delete orphaned upload");
            }
            return Err(e.into());
        }
    };

    record_asset_uploaded(asset_type.as_str(), size as u64);
    info!(
        asset_id = %asset.asset_id,
        asset_type = %asset_type,
        size,
        "Asset uploaded"
    );

    Ok((StatusCode::CREATED, Json(asset.into())))
}

/// Delete an original asset, retracting it from every group first.
///
/// DELETE /api/v1/admin/assets/:asset_id
pub async fn delete_asset(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
) -> Result<Json<ContentRemovalResponse>, ApiError> {
    let removal = state.content.delete_asset(&asset_id).await?;
    Ok(Json(removal))
}
