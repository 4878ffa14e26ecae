use serde::{Deserialize, Serialize};

use crate::geometry::DisplayRect;

/// One of the eight resize affordances on a crop rectangle: the four
/// corners and the four edge midpoints. Each handle moves exactly the
/// edges it names; opposite edges stay anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Nw,
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
}

/// CSS cursor shown while hovering a zone of the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorStyle {
    Default,
    Move,
    NwResize,
    NResize,
    NeResize,
    EResize,
    SeResize,
    SResize,
    SwResize,
    WResize,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::N,
        Handle::Ne,
        Handle::E,
        Handle::Se,
        Handle::S,
        Handle::Sw,
        Handle::W,
    ];

    /// Marker center for this handle on the given rect.
    pub fn anchor(&self, rect: &DisplayRect) -> (f32, f32) {
        let mid_x = rect.x + rect.width / 2.0;
        let mid_y = rect.y + rect.height / 2.0;
        match self {
            Handle::Nw => (rect.x, rect.y),
            Handle::N => (mid_x, rect.y),
            Handle::Ne => (rect.right(), rect.y),
            Handle::E => (rect.right(), mid_y),
            Handle::Se => (rect.right(), rect.bottom()),
            Handle::S => (mid_x, rect.bottom()),
            Handle::Sw => (rect.x, rect.bottom()),
            Handle::W => (rect.x, mid_y),
        }
    }

    pub fn cursor(&self) -> CursorStyle {
        match self {
            Handle::Nw => CursorStyle::NwResize,
            Handle::N => CursorStyle::NResize,
            Handle::Ne => CursorStyle::NeResize,
            Handle::E => CursorStyle::EResize,
            Handle::Se => CursorStyle::SeResize,
            Handle::S => CursorStyle::SResize,
            Handle::Sw => CursorStyle::SwResize,
            Handle::W => CursorStyle::WResize,
        }
    }

    /// Candidate rect for a pointer at (px, py) while this handle is held.
    /// May be degenerate; the session validates size before committing.
    pub fn resize(&self, rect: &DisplayRect, px: f32, py: f32) -> DisplayRect {
        let right = rect.right();
        let bottom = rect.bottom();
        match self {
            Handle::Nw => DisplayRect {
                x: px,
                y: py,
                width: right - px,
                height: bottom - py,
            },
            Handle::N => DisplayRect {
                y: py,
                height: bottom - py,
                ..*rect
            },
            Handle::Ne => DisplayRect {
                y: py,
                width: px - rect.x,
                height: bottom - py,
                ..*rect
            },
            Handle::E => DisplayRect {
                width: px - rect.x,
                ..*rect
            },
            Handle::Se => DisplayRect {
                width: px - rect.x,
                height: py - rect.y,
                ..*rect
            },
            Handle::S => DisplayRect {
                height: py - rect.y,
                ..*rect
            },
            Handle::Sw => DisplayRect {
                x: px,
                width: right - px,
                height: py - rect.y,
                ..*rect
            },
            Handle::W => DisplayRect {
                x: px,
                width: right - px,
                ..*rect
            },
        }
    }
}

/// Which handle zone, if any, the pointer currently hits. Corners win over
/// edge midpoints so the diagonal cursors stay reachable at small sizes.
pub fn hit_test(rect: &DisplayRect, px: f32, py: f32, radius: f32) -> Option<Handle> {
    let corner_order = [Handle::Nw, Handle::Ne, Handle::Sw, Handle::Se];
    let edge_order = [Handle::N, Handle::S, Handle::W, Handle::E];

    for handle in corner_order.iter().chain(edge_order.iter()) {
        let (hx, hy) = handle.anchor(rect);
        if (px - hx).abs() < radius && (py - hy).abs() < radius {
            return Some(*handle);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> DisplayRect {
        DisplayRect {
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 50.0,
        }
    }

    #[test]
    fn hit_test_finds_corners_and_midpoints() {
        let r = rect();
        assert_eq!(hit_test(&r, 11.0, 9.0, 10.0), Some(Handle::Nw));
        assert_eq!(hit_test(&r, 60.0, 60.0, 10.0), Some(Handle::Se));
        assert_eq!(hit_test(&r, 35.0, 10.0, 10.0), Some(Handle::N));
        assert_eq!(hit_test(&r, 60.0, 35.0, 10.0), Some(Handle::E));
        // Center of the body is no handle zone.
        assert_eq!(hit_test(&r, 35.0, 35.0, 10.0), None);
    }

    #[test]
    fn corner_wins_over_adjacent_edge() {
        let r = rect();
        // Close to both Nw corner and N midpoint on a tiny rect; corner is
        // checked first.
        let tiny = DisplayRect {
            width: 14.0,
            height: 14.0,
            ..r
        };
        assert_eq!(hit_test(&tiny, 12.0, 10.0, 10.0), Some(Handle::Nw));
    }

    #[test]
    fn se_resize_keeps_origin_anchored() {
        let resized = Handle::Se.resize(&rect(), 40.0, 40.0);
        assert_eq!(resized.x, 10.0);
        assert_eq!(resized.y, 10.0);
        assert_eq!(resized.width, 30.0);
        assert_eq!(resized.height, 30.0);
    }

    #[test]
    fn nw_resize_moves_origin_and_size_together() {
        let resized = Handle::Nw.resize(&rect(), 0.0, 5.0);
        assert_eq!(resized.x, 0.0);
        assert_eq!(resized.y, 5.0);
        assert_eq!(resized.width, 60.0);
        assert_eq!(resized.height, 55.0);
    }

    #[test]
    fn edge_handles_touch_one_axis_only() {
        let e = Handle::E.resize(&rect(), 90.0, 500.0);
        assert_eq!(e.x, 10.0);
        assert_eq!(e.y, 10.0);
        assert_eq!(e.width, 80.0);
        assert_eq!(e.height, 50.0);

        let n = Handle::N.resize(&rect(), -40.0, 0.0);
        assert_eq!(n.x, 10.0);
        assert_eq!(n.y, 0.0);
        assert_eq!(n.width, 50.0);
        assert_eq!(n.height, 60.0);
    }
}
