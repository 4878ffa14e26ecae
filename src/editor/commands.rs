use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use tauri::State;
use tracing::info;

use super::config::{EditorConfig, EditorConfigOverrides};
use super::frame::FrameDescription;
use super::raster::{self, RasterError};
use super::{
    close_session, install_session, preview, with_session, CropPayload, EditorError,
    EditorSession, PointerUpdate,
};
use crate::geometry::{CanvasSize, NormalizedBox};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    /// Upload key, file path, or data URL for the photo being cropped.
    pub source_key: String,
    #[serde(rename = "box")]
    pub seed: NormalizedBox,
    /// Size of the container the canvas must fit into.
    pub container: CanvasSize,
    #[serde(default)]
    pub overrides: Option<EditorConfigOverrides>,
    /// Present when re-editing an already-stored item.
    #[serde(default)]
    pub item_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionResponse {
    pub session_id: String,
    pub canvas: CanvasSize,
    pub label: String,
    pub frame: FrameDescription,
}

/// Decode the source off-thread, then seed and install the single active
/// session. Until this returns, no pointer command can observe the session,
/// which is the readiness gate the editor relies on.
#[tauri::command]
pub async fn editor_open_session(
    state: State<'_, AppState>,
    request: OpenSessionRequest,
) -> Result<OpenSessionResponse, String> {
    let sources = state.sources.clone();
    let key = request.source_key.clone();
    let source = tauri::async_runtime::spawn_blocking(move || sources.resolve(&key))
        .await
        .map_err(|err| err.to_string())?
        .map_err(|err| err.to_string())?;

    let config = EditorConfig::default().with_overrides(&request.overrides.unwrap_or_default());
    let session = EditorSession::open(
        request.source_key,
        source,
        &request.seed,
        request.container,
        config,
        request.item_id,
    )
    .map_err(|err| err.to_string())?;

    info!("crop session {} opened on {}", session.id, session.source_key);
    let response = OpenSessionResponse {
        session_id: session.id.clone(),
        canvas: session.canvas(),
        label: session.label().to_string(),
        frame: session.frame(),
    };
    install_session(&state.editor, session);
    Ok(response)
}

#[tauri::command]
pub fn editor_pointer_down(
    state: State<AppState>,
    session_id: String,
    x: f32,
    y: f32,
) -> Result<PointerUpdate, String> {
    with_session(&state.editor, &session_id, |session| {
        session.pointer_down(x, y)
    })
    .map_err(|err| err.to_string())
}

#[tauri::command]
pub fn editor_pointer_move(
    state: State<AppState>,
    session_id: String,
    x: f32,
    y: f32,
) -> Result<PointerUpdate, String> {
    with_session(&state.editor, &session_id, |session| {
        session.pointer_move(x, y)
    })
    .map_err(|err| err.to_string())
}

#[tauri::command]
pub fn editor_pointer_up(
    state: State<AppState>,
    session_id: String,
) -> Result<PointerUpdate, String> {
    with_session(&state.editor, &session_id, |session| session.pointer_up())
        .map_err(|err| err.to_string())
}

#[tauri::command]
pub fn editor_save_crop(
    state: State<AppState>,
    session_id: String,
    label: Option<String>,
) -> Result<CropPayload, String> {
    let payload = with_session(&state.editor, &session_id, |session| session.save(label))
        .map_err(|err| match err {
            // Committing without a loaded session is a missing source, not
            // a stale pointer event.
            EditorError::NotReady => EditorError::MissingSource,
            other => other,
        })
        .map_err(|err| err.to_string())?
        .map_err(|err| err.to_string())?;

    info!(
        "crop session {} committed {}x{} at ({}, {})",
        session_id,
        payload.pixel_rect.width,
        payload.pixel_rect.height,
        payload.pixel_rect.x,
        payload.pixel_rect.y
    );
    Ok(payload)
}

/// Flattened PNG of the current frame (image, dim layer, border, handles),
/// optionally downscaled, as a data URL.
#[tauri::command]
pub fn editor_render_preview(
    state: State<AppState>,
    session_id: String,
    max_width: Option<u32>,
) -> Result<String, String> {
    with_session(&state.editor, &session_id, |session| {
        let mut rendered = preview::render(&session.frame(), session.source());
        if let Some(target) = max_width {
            if target > 0 && rendered.width() > target {
                let scaled_height = std::cmp::max(
                    1,
                    (target as u64 * rendered.height() as u64 / rendered.width() as u64) as u32,
                );
                rendered = image::imageops::resize(
                    &rendered,
                    target,
                    scaled_height,
                    image::imageops::FilterType::Triangle,
                );
            }
        }

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(rendered)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|err| RasterError::Encode(err.to_string()))?;
        Ok::<_, RasterError>(raster::encode_data_url(&png))
    })
    .map_err(|err| err.to_string())?
    .map_err(|err| err.to_string())
}

#[tauri::command]
pub fn editor_close_session(state: State<AppState>, session_id: String) -> Result<bool, String> {
    Ok(close_session(&state.editor, &session_id))
}
