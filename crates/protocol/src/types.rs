use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A viewport-relative box, as returned by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
    };

    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Build a rect from its top and bottom edges (x = 0).
    pub fn vertical(top: f64, bottom: f64) -> Self {
        Self::new(0.0, top, 0.0, bottom - top)
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Midpoint of the right edge.
    pub fn right_middle(&self) -> Point {
        Point::new(self.right(), self.y + self.h / 2.0)
    }
}

/// Window scroll and size state at the moment of a read.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportMetrics {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
    /// Full document height (`max(documentElement, body).scrollHeight`).
    pub scroll_height: f64,
    pub scroll_width: f64,
}

impl ViewportMetrics {
    /// Largest reachable scroll offset, never below one pixel.
    pub fn max_scroll(&self) -> f64 {
        (self.scroll_height - self.height).max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 70.0);
        assert_eq!(r.center(), Point::new(60.0, 45.0));
        assert_eq!(r.right_middle(), Point::new(110.0, 45.0));
    }

    #[test]
    fn max_scroll_has_floor() {
        let m = ViewportMetrics {
            height: 800.0,
            scroll_height: 600.0,
            ..ViewportMetrics::default()
        };
        assert_eq!(m.max_scroll(), 1.0);
    }
}
