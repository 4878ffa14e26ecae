//! Interactive crop editor. One session at a time owns a live
//! [`DisplayRect`] over a decoded source image and feeds pointer input
//! through a small state machine (idle / dragging / resizing); every
//! mutation yields a fresh [`frame::FrameDescription`] for the frontend
//! canvas, and commit rasterizes the crop at source resolution.

pub mod commands;
pub mod config;
pub mod frame;
pub mod handles;
pub mod preview;
pub mod raster;

use std::sync::{Arc, Mutex};

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{
    self, CanvasSize, DisplayRect, GeometryError, NormalizedBox, PixelRect,
};
use config::EditorConfig;
use frame::{FrameDescription, ImageExtent};
use handles::{hit_test, CursorStyle, Handle};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no active crop session")]
    NotReady,
    #[error("unknown crop session: {0}")]
    SessionNotFound(String),
    #[error("no source image loaded")]
    MissingSource,
    #[error("failed to encode crop: {0}")]
    EncodeFailure(String),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// What the pointer is currently doing to the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
enum InteractionMode {
    Idle,
    Dragging { grab_dx: f32, grab_dy: f32 },
    Resizing { handle: Handle },
}

/// Result of feeding one pointer event to the session. `frame` is present
/// only when the rect actually changed and a redraw is due.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerUpdate {
    pub frame: Option<FrameDescription>,
    pub cursor: CursorStyle,
}

/// Finished crop handed to the catalog collaborator. The editor itself
/// never persists anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropPayload {
    pub image_url: String,
    pub label: String,
    pub crop_box: NormalizedBox,
    pub pixel_rect: PixelRect,
}

pub struct EditorSession {
    pub id: String,
    pub source_key: String,
    /// Read-only once loaded; shared with the cache and safe to read from
    /// redraw and commit alike.
    source: Arc<DynamicImage>,
    source_width: u32,
    source_height: u32,
    canvas: CanvasSize,
    rect: DisplayRect,
    label: String,
    /// Set when re-editing an already-stored item, so deleting that item
    /// can close this session.
    pub item_id: Option<String>,
    mode: InteractionMode,
    config: EditorConfig,
}

impl EditorSession {
    /// A session only exists once the source raster has finished decoding
    /// and the fitted canvas size is known; interaction before this point
    /// is impossible by construction.
    pub fn open(
        source_key: String,
        source: Arc<DynamicImage>,
        seed: &NormalizedBox,
        container: CanvasSize,
        config: EditorConfig,
        item_id: Option<String>,
    ) -> Result<Self, EditorError> {
        let (source_width, source_height) = source.dimensions();
        let canvas = geometry::fit_canvas(container, source_width, source_height, config.fit_margin)?;
        let seed = seed.clamped();
        let rect = geometry::to_display_rect(&seed, canvas)?;

        Ok(Self {
            id: format!("sess-{:08x}", rand::random::<u32>()),
            source_key,
            source,
            source_width,
            source_height,
            canvas,
            rect,
            label: seed.label,
            item_id,
            mode: InteractionMode::Idle,
            config,
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &DynamicImage {
        &self.source
    }

    pub fn frame(&self) -> FrameDescription {
        self.frame_with_cursor(self.mode_cursor())
    }

    fn frame_with_cursor(&self, cursor: CursorStyle) -> FrameDescription {
        frame::describe(
            &self.rect,
            self.canvas,
            ImageExtent {
                width: self.source_width,
                height: self.source_height,
            },
            &self.config,
            cursor,
        )
    }

    fn mode_cursor(&self) -> CursorStyle {
        match self.mode {
            InteractionMode::Idle => CursorStyle::Default,
            InteractionMode::Dragging { .. } => CursorStyle::Move,
            InteractionMode::Resizing { handle } => handle.cursor(),
        }
    }

    fn hover_cursor(&self, x: f32, y: f32) -> CursorStyle {
        if let Some(handle) = hit_test(&self.rect, x, y, self.config.handle_hit_radius) {
            handle.cursor()
        } else if self.rect.contains(x, y) {
            CursorStyle::Move
        } else {
            CursorStyle::Default
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) -> PointerUpdate {
        if let Some(handle) = hit_test(&self.rect, x, y, self.config.handle_hit_radius) {
            self.mode = InteractionMode::Resizing { handle };
            return PointerUpdate {
                frame: None,
                cursor: handle.cursor(),
            };
        }
        if self.rect.contains(x, y) {
            self.mode = InteractionMode::Dragging {
                grab_dx: x - self.rect.x,
                grab_dy: y - self.rect.y,
            };
            return PointerUpdate {
                frame: None,
                cursor: CursorStyle::Move,
            };
        }
        // Pointer-down outside the rect is a no-op.
        PointerUpdate {
            frame: None,
            cursor: CursorStyle::Default,
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> PointerUpdate {
        match self.mode {
            InteractionMode::Dragging { grab_dx, grab_dy } => {
                let moved = DisplayRect {
                    x: (x - grab_dx).min(self.canvas.width - self.rect.width).max(0.0),
                    y: (y - grab_dy).min(self.canvas.height - self.rect.height).max(0.0),
                    ..self.rect
                };
                let changed = moved != self.rect;
                self.rect = moved;
                PointerUpdate {
                    frame: changed.then(|| self.frame_with_cursor(CursorStyle::Move)),
                    cursor: CursorStyle::Move,
                }
            }
            InteractionMode::Resizing { handle } => {
                let mut candidate = handle.resize(&self.rect, x, y);
                if self.config.clamp_resize_to_canvas {
                    candidate = clamp_edges(&candidate, self.canvas);
                }
                // Sub-minimum results discard this event; the rect keeps its
                // last valid value.
                if candidate.width > self.config.min_crop_size
                    && candidate.height > self.config.min_crop_size
                {
                    let changed = candidate != self.rect;
                    self.rect = candidate;
                    PointerUpdate {
                        frame: changed.then(|| self.frame_with_cursor(handle.cursor())),
                        cursor: handle.cursor(),
                    }
                } else {
                    PointerUpdate {
                        frame: None,
                        cursor: handle.cursor(),
                    }
                }
            }
            InteractionMode::Idle => PointerUpdate {
                frame: None,
                cursor: self.hover_cursor(x, y),
            },
        }
    }

    pub fn pointer_up(&mut self) -> PointerUpdate {
        self.mode = InteractionMode::Idle;
        PointerUpdate {
            frame: None,
            cursor: CursorStyle::Default,
        }
    }

    /// Commit: map the on-screen rect back to source pixels (rounding only
    /// at the very end), rasterize the region 1:1 and encode it. The
    /// session stays open, so an encode failure can simply be retried.
    pub fn save(&self, label: Option<String>) -> Result<CropPayload, EditorError> {
        let label = label.unwrap_or_else(|| self.label.clone());
        let source_rect = geometry::to_source_rect(
            &self.rect,
            self.canvas,
            self.source_width,
            self.source_height,
        )?;
        let pixel_rect = source_rect.to_pixel_rect(self.source_width, self.source_height);

        let png = raster::crop_to_png(&self.source, pixel_rect)
            .map_err(|err| EditorError::EncodeFailure(err.to_string()))?;
        let crop_box = geometry::to_normalized_box(&self.rect, self.canvas, &label)?;

        Ok(CropPayload {
            image_url: raster::encode_data_url(&png),
            label,
            crop_box,
            pixel_rect,
        })
    }
}

fn clamp_edges(rect: &DisplayRect, canvas: CanvasSize) -> DisplayRect {
    let left = rect.x.max(0.0);
    let top = rect.y.max(0.0);
    let right = rect.right().min(canvas.width);
    let bottom = rect.bottom().min(canvas.height);
    DisplayRect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    }
}

/// The single active session. Locking serializes pointer events, so each
/// handler runs to completion before the next input is processed.
pub type EditorSlot = Mutex<Option<EditorSession>>;

pub fn install_session(slot: &EditorSlot, session: EditorSession) {
    *slot.lock().expect("poisoned") = Some(session);
}

pub fn with_session<T>(
    slot: &EditorSlot,
    session_id: &str,
    action: impl FnOnce(&mut EditorSession) -> T,
) -> Result<T, EditorError> {
    let mut guard = slot.lock().expect("poisoned");
    match guard.as_mut() {
        None => Err(EditorError::NotReady),
        Some(session) if session.id != session_id => {
            Err(EditorError::SessionNotFound(session_id.to_string()))
        }
        Some(session) => Ok(action(session)),
    }
}

pub fn close_session(slot: &EditorSlot, session_id: &str) -> bool {
    let mut guard = slot.lock().expect("poisoned");
    match guard.as_ref() {
        Some(session) if session.id == session_id => {
            *guard = None;
            true
        }
        _ => false,
    }
}

/// Close whatever session is editing `item_id`, if any. Used when the
/// item is deleted out from under the editor.
pub fn close_session_for_item(slot: &EditorSlot, item_id: &str) -> bool {
    let mut guard = slot.lock().expect("poisoned");
    match guard.as_ref() {
        Some(session) if session.item_id.as_deref() == Some(item_id) => {
            *guard = None;
            true
        }
        _ => false,
    }
}
