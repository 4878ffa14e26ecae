use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tauri::{Emitter, Manager};
use tracing::{info, warn};

pub mod editor;
pub mod geometry;
pub mod inventory;
pub mod sources;

use editor::EditorSlot;
use inventory::store::StoreError;
use inventory::Inventory;
use sources::SourceLibrary;

pub const INVENTORY_EVENT_NAME: &str = "inventory-changed";

pub struct AppState {
    pub sources: Arc<SourceLibrary>,
    pub inventory: Arc<Inventory>,
    /// The single active crop session.
    pub editor: Arc<EditorSlot>,
}

#[cfg(feature = "inventory-sqlite")]
fn create_inventory(db_path: PathBuf) -> Result<Inventory, StoreError> {
    let store = inventory::store::SqliteInventoryStore::new(db_path)?;
    Ok(Inventory::new(Arc::new(store)))
}

#[cfg(not(feature = "inventory-sqlite"))]
fn create_inventory(_db_path: PathBuf) -> Result<Inventory, StoreError> {
    Ok(Inventory::new(Arc::new(
        inventory::store::InMemoryInventoryStore::new(),
    )))
}

#[tauri::command]
async fn sources_store_upload(
    state: tauri::State<'_, AppState>,
    file_name: String,
    data_url: String,
) -> Result<sources::StoredUpload, String> {
    let library = state.sources.clone();
    tauri::async_runtime::spawn_blocking(move || {
        library
            .store_upload(&file_name, &data_url)
            .map_err(|err| err.to_string())
    })
    .await
    .map_err(|err| err.to_string())?
}

#[tauri::command]
fn sources_list_uploads(
    state: tauri::State<AppState>,
) -> Result<Vec<sources::UploadEntry>, String> {
    state.sources.list_uploads().map_err(|err| err.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt::init();

    tauri::Builder::default()
        .setup(|app| {
            let app_data_dir = app.path().app_data_dir()?;
            fs::create_dir_all(&app_data_dir)?;

            let sources = Arc::new(SourceLibrary::new(app_data_dir.join("uploads"))?);
            let inventory = Arc::new(create_inventory(app_data_dir.join("inventory.db"))?);

            // Every catalog change is forwarded to the frontend as an event;
            // observers only fire after the store mutation succeeded.
            let handle = app.handle().clone();
            inventory.subscribe(move |event| {
                if let Err(err) = handle.emit(INVENTORY_EVENT_NAME, event.clone()) {
                    warn!("failed to forward inventory event: {}", err);
                }
            });

            let item_count = inventory.list_items().map(|items| items.len()).unwrap_or(0);
            info!("inventory ready with {} items", item_count);

            app.manage(AppState {
                sources,
                inventory,
                editor: Arc::new(Mutex::new(None)),
            });
            Ok(())
        })
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            editor::commands::editor_open_session,
            editor::commands::editor_pointer_down,
            editor::commands::editor_pointer_move,
            editor::commands::editor_pointer_up,
            editor::commands::editor_save_crop,
            editor::commands::editor_render_preview,
            editor::commands::editor_close_session,
            inventory::commands::inventory_list_items,
            inventory::commands::inventory_get_item,
            inventory::commands::inventory_add_item,
            inventory::commands::inventory_update_item,
            inventory::commands::inventory_apply_crop,
            inventory::commands::inventory_delete_item,
            inventory::commands::inventory_quick_save,
            sources_store_upload,
            sources_list_uploads
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
