//! Reference rendering of a [`FrameDescription`]: the same compositing the
//! frontend canvas performs (scaled image, dim layer with the crop window
//! cut out, border, handle squares), done in Rust against the real raster.
//! Used by the preview command and by tests that pin down redraw semantics.

use image::imageops::{resize, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use super::frame::FrameDescription;

pub fn render(frame: &FrameDescription, source: &DynamicImage) -> RgbaImage {
    let canvas_w = frame.canvas.width.round().max(1.0) as u32;
    let canvas_h = frame.canvas.height.round().max(1.0) as u32;

    let mut canvas = resize(&source.to_rgba8(), canvas_w, canvas_h, FilterType::Triangle);

    let crop_left = frame.rect.x;
    let crop_top = frame.rect.y;
    let crop_right = frame.rect.right();
    let crop_bottom = frame.rect.bottom();

    // Dim everything outside the crop window; the window itself keeps the
    // undimmed image, same effect as a destination-out cut on a canvas.
    let keep = 1.0 - frame.dim_opacity.clamp(0.0, 1.0);
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let fx = x as f32;
        let fy = y as f32;
        let inside =
            fx >= crop_left && fx < crop_right && fy >= crop_top && fy < crop_bottom;
        if !inside {
            let Rgba([r, g, b, a]) = *pixel;
            *pixel = Rgba([
                (r as f32 * keep) as u8,
                (g as f32 * keep) as u8,
                (b as f32 * keep) as u8,
                a,
            ]);
        }
    }

    let stroke = parse_hex_color(&frame.stroke_color);
    let rect_w = frame.rect.width.round().max(1.0) as u32;
    let rect_h = frame.rect.height.round().max(1.0) as u32;
    let rect_x = frame.rect.x.round() as i32;
    let rect_y = frame.rect.y.round() as i32;

    for inset in 0..frame.stroke_width.round().max(1.0) as u32 {
        if rect_w <= inset * 2 || rect_h <= inset * 2 {
            break;
        }
        draw_hollow_rect_mut(
            &mut canvas,
            Rect::at(rect_x + inset as i32, rect_y + inset as i32)
                .of_size(rect_w - inset * 2, rect_h - inset * 2),
            stroke,
        );
    }

    for marker in &frame.handles {
        let size = marker.size.round().max(1.0) as u32;
        let half = marker.size / 2.0;
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at((marker.x - half).round() as i32, (marker.y - half).round() as i32)
                .of_size(size, size),
            stroke,
        );
    }

    canvas
}

fn parse_hex_color(value: &str) -> Rgba<u8> {
    let hex = value.trim_start_matches('#');
    if hex.len() == 6 {
        if let Ok(parsed) = u32::from_str_radix(hex, 16) {
            return Rgba([
                (parsed >> 16) as u8,
                (parsed >> 8) as u8,
                parsed as u8,
                255,
            ]);
        }
    }
    Rgba([59, 130, 246, 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::config::EditorConfig;
    use crate::editor::frame::{describe, ImageExtent};
    use crate::editor::handles::CursorStyle;
    use crate::geometry::{CanvasSize, DisplayRect};

    #[test]
    fn crop_window_stays_bright_and_surroundings_dim() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            200,
            200,
            Rgba([200, 200, 200, 255]),
        ));
        let rect = DisplayRect {
            x: 40.0,
            y: 40.0,
            width: 40.0,
            height: 40.0,
        };
        let frame = describe(
            &rect,
            CanvasSize {
                width: 100.0,
                height: 100.0,
            },
            ImageExtent {
                width: 200,
                height: 200,
            },
            &EditorConfig::default(),
            CursorStyle::Default,
        );

        let rendered = render(&frame, &source);

        // Center of the crop window: the image shines through undimmed.
        let bright = rendered.get_pixel(60, 60)[0];
        assert!(bright >= 198, "expected undimmed pixel, got {bright}");
        // Well outside the window and away from handles: dimmed by half.
        let dimmed = rendered.get_pixel(5, 95)[0];
        assert!((95..=105).contains(&dimmed), "expected dimmed pixel, got {dimmed}");
    }

    #[test]
    fn border_and_handles_use_stroke_color() {
        let source =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255])));
        let rect = DisplayRect {
            x: 20.0,
            y: 20.0,
            width: 60.0,
            height: 60.0,
        };
        let frame = describe(
            &rect,
            CanvasSize {
                width: 100.0,
                height: 100.0,
            },
            ImageExtent {
                width: 100,
                height: 100,
            },
            &EditorConfig::default(),
            CursorStyle::Default,
        );

        let rendered = render(&frame, &source);
        let stroke = Rgba([0x3b, 0x82, 0xf6, 255]);
        // A point on the top border.
        assert_eq!(*rendered.get_pixel(50, 20), stroke);
        // The Se corner handle square extends past the border line.
        assert_eq!(*rendered.get_pixel(82, 82), stroke);
    }

    #[test]
    fn parses_stroke_colors_with_fallback() {
        assert_eq!(parse_hex_color("#ff8000"), Rgba([255, 128, 0, 255]));
        assert_eq!(parse_hex_color("bogus"), Rgba([59, 130, 246, 255]));
    }
}
