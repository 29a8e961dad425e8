//! Upload support handlers: dedup lookup and subtitle/image uploads.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use kstream_models::{AdminRole, Fingerprint};
use kstream_upload::{find_duplicate, upload_subtitle_file, DuplicateMatch};

use crate::auth::SessionUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::data;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub fingerprint: Fingerprint,
}

/// Look up an existing record by upload fingerprint. A miss (or a lookup
/// error, swallowed downstream) is `data: { match: null }`.
pub async fn dedup_lookup(
    State(state): State<AppState>,
    user: SessionUser,
    Json(request): Json<LookupRequest>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let hit = find_duplicate(state.content.as_ref(), &request.fingerprint).await;
    let payload = hit.map(|m| match &m {
        DuplicateMatch::Movie(movie) => json!({
            "kind": "movie",
            "id": movie.id,
            "title": movie.title,
            "assetId": movie.mux_asset_id,
            "playbackId": m.playback_id(),
            "thumbnail": movie.thumbnail,
            "trailer": movie.trailer,
        }),
        DuplicateMatch::Episode { series, episode } => json!({
            "kind": "episode",
            "seriesId": series.id,
            "seriesTitle": series.title,
            "episodeId": episode.episode_id,
            "epNumber": episode.ep_number,
            "assetId": episode.mux_asset_id,
            "playbackId": m.playback_id(),
            "thumbnail": episode.thumbnail,
        }),
    });

    Ok(data(json!({ "match": payload })))
}

struct SubtitleUpload {
    content_id: String,
    lang: String,
    body: String,
}

async fn read_subtitle_multipart(mut multipart: Multipart) -> ApiResult<SubtitleUpload> {
    let mut content_id = None;
    let mut lang = None;
    let mut body = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("contentId") => {
                content_id = Some(field.text().await.map_err(bad_field)?);
            }
            Some("lang") => {
                lang = Some(field.text().await.map_err(bad_field)?);
            }
            Some("file") => {
                body = Some(field.text().await.map_err(bad_field)?);
            }
            _ => {}
        }
    }

    Ok(SubtitleUpload {
        content_id: required(content_id, "contentId")?,
        lang: required(lang, "lang")?,
        body: required(body, "file")?,
    })
}

/// Upload a subtitle file (SRT or VTT). The file is normalized to VTT and
/// stored in blob storage; the response reports the upload status alongside
/// the public URL, the same shape the sync endpoint uses for its side.
pub async fn upload_subtitle(
    State(state): State<AppState>,
    user: SessionUser,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let upload = read_subtitle_multipart(multipart).await?;
    let blob = state.blob()?;

    let report =
        upload_subtitle_file(blob, &upload.content_id, &upload.lang, &upload.body).await;

    info!(
        content_id = %upload.content_id,
        lang = %upload.lang,
        status = ?report.status,
        "Subtitle upload finished"
    );
    Ok(data(report))
}

/// Upload an image (thumbnail/poster) and return its public URL.
pub async fn upload_image(
    State(state): State<AppState>,
    user: SessionUser,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let mut content_id = None;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("contentId") => {
                content_id = Some(field.text().await.map_err(bad_field)?);
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or("image.jpg").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_field)?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let content_id = required(content_id, "contentId")?;
    let (filename, content_type, bytes) = required(file, "file")?;

    if !content_type.starts_with("image/") {
        return Err(ApiError::bad_request("File must be an image"));
    }

    let blob = state.blob()?;
    let url = blob
        .upload_image(&content_id, &filename, bytes, &content_type)
        .await?;

    info!(content_id = %content_id, "Image stored");
    Ok(data(json!({ "url": url })))
}

fn required<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::bad_request(format!("Missing multipart field: {field}")))
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::bad_request(format!("Unreadable multipart field: {e}"))
}
