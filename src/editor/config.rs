use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Smallest width/height a resize may commit, in canvas pixels.
    pub min_crop_size: f32,
    /// Half-size of the square zone around each handle that captures the
    /// pointer.
    pub handle_hit_radius: f32,
    /// Edge length of the drawn handle markers.
    pub handle_size: f32,
    pub dim_opacity: f32,
    pub stroke_width: f32,
    pub stroke_color: String,
    /// Fraction of the fitted size the canvas actually uses, leaving a
    /// margin inside the container.
    pub fit_margin: f32,
    /// Keep resize results inside the canvas, same as drags.
    pub clamp_resize_to_canvas: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_crop_size: 20.0,
            handle_hit_radius: 10.0,
            handle_size: 8.0,
            dim_opacity: 0.5,
            stroke_width: 2.0,
            stroke_color: "#3b82f6".to_string(),
            fit_margin: 0.9,
            clamp_resize_to_canvas: true,
        }
    }
}

impl EditorConfig {
    pub fn with_overrides(mut self, overrides: &EditorConfigOverrides) -> Self {
        self.min_crop_size = overrides.min_crop_size.unwrap_or(self.min_crop_size);
        self.handle_hit_radius = overrides
            .handle_hit_radius
            .unwrap_or(self.handle_hit_radius);
        self.handle_size = overrides.handle_size.unwrap_or(self.handle_size);
        self.dim_opacity = overrides.dim_opacity.unwrap_or(self.dim_opacity);
        self.stroke_width = overrides.stroke_width.unwrap_or(self.stroke_width);
        if let Some(color) = overrides.stroke_color.as_ref() {
            self.stroke_color = color.clone();
        }
        self.fit_margin = overrides.fit_margin.unwrap_or(self.fit_margin);
        self.clamp_resize_to_canvas = overrides
            .clamp_resize_to_canvas
            .unwrap_or(self.clamp_resize_to_canvas);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfigOverrides {
    pub min_crop_size: Option<f32>,
    pub handle_hit_radius: Option<f32>,
    pub handle_size: Option<f32>,
    pub dim_opacity: Option<f32>,
    pub stroke_width: Option<f32>,
    pub stroke_color: Option<String>,
    pub fit_margin: Option<f32>,
    pub clamp_resize_to_canvas: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_provided_fields() {
        let overrides = EditorConfigOverrides {
            min_crop_size: Some(32.0),
            stroke_color: Some("#ff0000".to_string()),
            clamp_resize_to_canvas: Some(false),
            ..Default::default()
        };

        let updated = EditorConfig::default().with_overrides(&overrides);

        assert_eq!(updated.min_crop_size, 32.0);
        assert_eq!(updated.stroke_color, "#ff0000");
        assert!(!updated.clamp_resize_to_canvas);
        assert_eq!(updated.handle_hit_radius, 10.0);
        assert_eq!(updated.dim_opacity, 0.5);
    }
}
