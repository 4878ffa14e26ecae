use image::GenericImageView;
use serde::Deserialize;
use tauri::State;
use tracing::info;

use super::store::StoreError;
use super::types::{InventoryDraft, InventoryItem, InventoryPatch};
use super::Inventory;
use crate::editor::raster;
use crate::editor::{close_session_for_item, CropPayload, EditorSlot};
use crate::geometry::{NormalizedBox, SourceRect};
use crate::sources::SourceLibrary;
use crate::AppState;

#[tauri::command]
pub fn inventory_list_items(state: State<AppState>) -> Result<Vec<InventoryItem>, String> {
    state.inventory.list_items().map_err(|err| err.to_string())
}

#[tauri::command]
pub fn inventory_get_item(
    state: State<AppState>,
    id: String,
) -> Result<Option<InventoryItem>, String> {
    state.inventory.get_item(&id).map_err(|err| err.to_string())
}

#[tauri::command]
pub fn inventory_add_item(
    state: State<AppState>,
    draft: InventoryDraft,
) -> Result<InventoryItem, String> {
    let item = state
        .inventory
        .add_item(draft)
        .map_err(|err| err.to_string())?;
    info!("added inventory item {} ({})", item.id, item.label);
    Ok(item)
}

#[tauri::command]
pub fn inventory_update_item(
    state: State<AppState>,
    id: String,
    patch: InventoryPatch,
) -> Result<InventoryItem, String> {
    state
        .inventory
        .update_item(&id, &patch)
        .map_err(|err| err.to_string())
}

/// Re-edit commit: replace the stored crop image, label and region in one
/// patch, leaving tags/category/notes untouched.
#[tauri::command]
pub fn inventory_apply_crop(
    state: State<AppState>,
    id: String,
    payload: CropPayload,
) -> Result<InventoryItem, String> {
    let patch = InventoryPatch {
        label: Some(payload.label),
        image_url: Some(payload.image_url),
        original_box: Some(payload.crop_box),
        ..Default::default()
    };
    state
        .inventory
        .update_item(&id, &patch)
        .map_err(|err| err.to_string())
}

#[tauri::command]
pub fn inventory_delete_item(state: State<AppState>, id: String) -> Result<bool, String> {
    delete_item_and_release(&state.inventory, &state.editor, &id).map_err(|err| err.to_string())
}

/// Delete an item and, if it is the one currently open in the editor,
/// close that session so a later save cannot resurrect the record.
pub fn delete_item_and_release(
    inventory: &Inventory,
    editor: &EditorSlot,
    id: &str,
) -> Result<bool, StoreError> {
    let removed = inventory.delete_item(id)?;
    if removed && close_session_for_item(editor, id) {
        info!("closed crop session for deleted item {}", id);
    }
    Ok(removed)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickSaveRequest {
    pub source_key: String,
    #[serde(rename = "box")]
    pub seed: NormalizedBox,
}

/// One-step save of a detection box without an interactive session: crop
/// the region straight out of the source at native resolution and file it.
#[tauri::command]
pub async fn inventory_quick_save(
    state: State<'_, AppState>,
    request: QuickSaveRequest,
) -> Result<InventoryItem, String> {
    let sources = state.sources.clone();
    let inventory = state.inventory.clone();
    tauri::async_runtime::spawn_blocking(move || quick_save(&sources, &inventory, request))
        .await
        .map_err(|err| err.to_string())?
}

pub(crate) fn quick_save(
    sources: &SourceLibrary,
    inventory: &Inventory,
    request: QuickSaveRequest,
) -> Result<InventoryItem, String> {
    let source = sources
        .resolve(&request.source_key)
        .map_err(|err| err.to_string())?;
    let (width, height) = source.dimensions();
    let seed = request.seed.clamped();

    let pixel_rect = SourceRect {
        x: seed.x * width as f32,
        y: seed.y * height as f32,
        width: seed.width * width as f32,
        height: seed.height * height as f32,
    }
    .to_pixel_rect(width, height);

    let png = raster::crop_to_png(&source, pixel_rect).map_err(|err| err.to_string())?;
    let draft = InventoryDraft {
        image_url: raster::encode_data_url(&png),
        label: seed.label.clone(),
        category: None,
        tags: None,
        source_image_url: Some(request.source_key.clone()),
        notes: None,
        original_box: seed,
        metadata: None,
    };

    let item = inventory.add_item(draft).map_err(|err| err.to_string())?;
    info!("quick-saved {} from {}", item.id, request.source_key);
    Ok(item)
}
