//! The redraw half of the editor, kept as a pure function: geometry in,
//! paint list out. The frontend canvas replays a [`FrameDescription`]
//! verbatim (draw the scaled image, dim everything, cut the crop window
//! back out, stroke the border, fill the handle squares), which keeps
//! every redraw decision unit-testable without a canvas.

use serde::{Deserialize, Serialize};

use super::config::EditorConfig;
use super::handles::{CursorStyle, Handle};
use crate::geometry::{CanvasSize, DisplayRect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageExtent {
    pub width: u32,
    pub height: u32,
}

/// A handle marker square, centered on its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleMarker {
    pub handle: Handle,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDescription {
    pub canvas: CanvasSize,
    pub image: ImageExtent,
    pub rect: DisplayRect,
    pub dim_opacity: f32,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub handles: Vec<HandleMarker>,
    pub cursor: CursorStyle,
}

pub fn describe(
    rect: &DisplayRect,
    canvas: CanvasSize,
    image: ImageExtent,
    config: &EditorConfig,
    cursor: CursorStyle,
) -> FrameDescription {
    let handles = Handle::ALL
        .iter()
        .map(|handle| {
            let (x, y) = handle.anchor(rect);
            HandleMarker {
                handle: *handle,
                x,
                y,
                size: config.handle_size,
            }
        })
        .collect();

    FrameDescription {
        canvas,
        image,
        rect: *rect,
        dim_opacity: config.dim_opacity,
        stroke_color: config.stroke_color.clone(),
        stroke_width: config.stroke_width,
        handles,
        cursor,
    }
}
