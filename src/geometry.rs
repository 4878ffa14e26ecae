//! Conversions between the three coordinate spaces of a crop session:
//! normalized image-relative [0,1], on-screen canvas pixels, and source
//! image pixels. All functions are pure; rounding to integer pixels only
//! happens in [`SourceRect::to_pixel_rect`], right before rasterization.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("canvas has no area: {width}x{height}")]
    InvalidCanvas { width: f32, height: f32 },
    #[error("container has no area: {width}x{height}")]
    InvalidContainer { width: f32, height: f32 },
    #[error("source image has no area: {width}x{height}")]
    InvalidSource { width: u32, height: u32 },
}

/// A detection result or stored crop region, expressed as fractions of the
/// source image. Upstream detectors do not guarantee the [0,1] invariant,
/// so callers clamp with [`NormalizedBox::clamped`] before mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
}

impl NormalizedBox {
    pub fn clamped(&self) -> NormalizedBox {
        let x = self.x.clamp(0.0, 1.0);
        let y = self.y.clamp(0.0, 1.0);
        NormalizedBox {
            x,
            y,
            width: self.width.clamp(0.0, 1.0 - x),
            height: self.height.clamp(0.0, 1.0 - y),
            label: self.label.clone(),
        }
    }
}

/// A rectangle in on-screen canvas pixels, after fit-to-container scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    fn ensure_valid(&self) -> Result<(), GeometryError> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(GeometryError::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// A rectangle in source-image pixel units, kept fractional so that the
/// two scale factors compose without intermediate rounding loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SourceRect {
    /// The single rounding step. The result is clamped inside the source
    /// image and never degenerates below 1x1.
    pub fn to_pixel_rect(&self, source_width: u32, source_height: u32) -> PixelRect {
        let x = (self.x.round().max(0.0) as u32).min(source_width.saturating_sub(1));
        let y = (self.y.round().max(0.0) as u32).min(source_height.saturating_sub(1));
        let width = (self.width.round().max(1.0) as u32).min(source_width - x).max(1);
        let height = (self.height.round().max(1.0) as u32).min(source_height - y).max(1);
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

/// Integer crop rectangle in source-image pixels, ready for rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Fitted canvas size for a source image inside a container, preserving
/// aspect ratio with a margin factor (the editor leaves a little breathing
/// room around the image, matching `EditorConfig::fit_margin`).
pub fn fit_canvas(
    container: CanvasSize,
    source_width: u32,
    source_height: u32,
    margin: f32,
) -> Result<CanvasSize, GeometryError> {
    if container.width <= 0.0 || container.height <= 0.0 {
        return Err(GeometryError::InvalidContainer {
            width: container.width,
            height: container.height,
        });
    }
    if source_width == 0 || source_height == 0 {
        return Err(GeometryError::InvalidSource {
            width: source_width,
            height: source_height,
        });
    }

    let scale = (container.width / source_width as f32)
        .min(container.height / source_height as f32)
        * margin;

    Ok(CanvasSize {
        width: source_width as f32 * scale,
        height: source_height as f32 * scale,
    })
}

pub fn to_display_rect(
    box_: &NormalizedBox,
    canvas: CanvasSize,
) -> Result<DisplayRect, GeometryError> {
    canvas.ensure_valid()?;
    Ok(DisplayRect {
        x: box_.x * canvas.width,
        y: box_.y * canvas.height,
        width: box_.width * canvas.width,
        height: box_.height * canvas.height,
    })
}

pub fn to_normalized_box(
    rect: &DisplayRect,
    canvas: CanvasSize,
    label: &str,
) -> Result<NormalizedBox, GeometryError> {
    canvas.ensure_valid()?;
    let raw = NormalizedBox {
        x: rect.x / canvas.width,
        y: rect.y / canvas.height,
        width: (rect.width / canvas.width).max(0.0),
        height: (rect.height / canvas.height).max(0.0),
        label: label.to_string(),
    };
    Ok(raw.clamped())
}

/// Canvas-space rect to source-pixel space in one composed scale, so the
/// display rounding the canvas applied never reaches the source crop.
pub fn to_source_rect(
    rect: &DisplayRect,
    canvas: CanvasSize,
    source_width: u32,
    source_height: u32,
) -> Result<SourceRect, GeometryError> {
    canvas.ensure_valid()?;
    if source_width == 0 || source_height == 0 {
        return Err(GeometryError::InvalidSource {
            width: source_width,
            height: source_height,
        });
    }

    let scale_x = source_width as f32 / canvas.width;
    let scale_y = source_height as f32 / canvas.height;

    Ok(SourceRect {
        x: rect.x * scale_x,
        y: rect.y * scale_y,
        width: rect.width * scale_x,
        height: rect.height * scale_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn boxed(x: f32, y: f32, width: f32, height: f32) -> NormalizedBox {
        NormalizedBox {
            x,
            y,
            width,
            height,
            label: "mug".to_string(),
        }
    }

    #[test]
    fn display_round_trip_recovers_normalized_box() {
        let canvases = [
            CanvasSize {
                width: 640.0,
                height: 480.0,
            },
            CanvasSize {
                width: 333.0,
                height: 911.0,
            },
        ];
        let boxes = [
            boxed(0.0, 0.0, 1.0, 1.0),
            boxed(0.25, 0.1, 0.5, 0.6),
            boxed(0.87, 0.9, 0.1, 0.05),
        ];

        for canvas in canvases {
            for original in &boxes {
                let rect = to_display_rect(original, canvas).unwrap();
                let back = to_normalized_box(&rect, canvas, &original.label).unwrap();
                assert!((back.x - original.x).abs() < EPS);
                assert!((back.y - original.y).abs() < EPS);
                assert!((back.width - original.width).abs() < EPS);
                assert!((back.height - original.height).abs() < EPS);
                assert_eq!(back.label, original.label);
            }
        }
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let canvas = CanvasSize {
            width: 0.0,
            height: 400.0,
        };
        assert!(to_display_rect(&boxed(0.1, 0.1, 0.5, 0.5), canvas).is_err());
        let rect = DisplayRect {
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 50.0,
        };
        assert!(to_normalized_box(&rect, canvas, "mug").is_err());
        assert!(to_source_rect(&rect, canvas, 1000, 800).is_err());
    }

    #[test]
    fn clamped_enforces_unit_bounds() {
        let out_of_range = boxed(-0.2, 0.9, 0.6, 0.4);
        let clamped = out_of_range.clamped();
        assert_eq!(clamped.x, 0.0);
        assert!((clamped.y - 0.9).abs() < EPS);
        assert!(clamped.x + clamped.width <= 1.0 + EPS);
        assert!(clamped.y + clamped.height <= 1.0 + EPS);
    }

    #[test]
    fn source_rect_composes_both_scales() {
        let canvas = CanvasSize {
            width: 500.0,
            height: 400.0,
        };
        let rect = DisplayRect {
            x: 50.0,
            y: 50.0,
            width: 100.0,
            height: 100.0,
        };
        let source = to_source_rect(&rect, canvas, 1000, 800).unwrap();
        let pixels = source.to_pixel_rect(1000, 800);
        assert_eq!(
            pixels,
            PixelRect {
                x: 100,
                y: 100,
                width: 200,
                height: 200,
            }
        );
    }

    #[test]
    fn pixel_rect_stays_inside_source() {
        let source = SourceRect {
            x: 990.0,
            y: -3.0,
            width: 50.0,
            height: 0.2,
        };
        let pixels = source.to_pixel_rect(1000, 800);
        assert!(pixels.x + pixels.width <= 1000);
        assert!(pixels.y + pixels.height <= 800);
        assert!(pixels.width >= 1);
        assert!(pixels.height >= 1);
    }

    #[test]
    fn fit_canvas_preserves_aspect_ratio() {
        let container = CanvasSize {
            width: 800.0,
            height: 400.0,
        };
        let fitted = fit_canvas(container, 1000, 1000, 0.9).unwrap();
        // Height is the limiting dimension for a square image here.
        assert!((fitted.height - 360.0).abs() < EPS);
        assert!((fitted.width - 360.0).abs() < EPS);
        assert!(fit_canvas(container, 0, 1000, 0.9).is_err());
    }
}
