use serde::{Deserialize, Serialize};

use crate::tech_name::TechName;
use crate::types::Rect;

/// Viewport-relative box, rounded to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxMetrics {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxMetrics {
    pub fn rounded(rect: &Rect) -> Self {
        Self {
            top: rect.top().round(),
            right: rect.right().round(),
            bottom: rect.bottom().round(),
            left: rect.left().round(),
            width: rect.w.round(),
            height: rect.h.round(),
        }
    }
}

/// Document-absolute offset (viewport box + scroll offset).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AbsoluteOffset {
    pub top: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementPosition {
    pub viewport: BoxMetrics,
    pub absolute: AbsoluteOffset,
}

impl ElementPosition {
    /// The position reported for an element that could not be measured.
    pub const ZEROED: ElementPosition = ElementPosition {
        viewport: BoxMetrics {
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
            left: 0.0,
            width: 0.0,
            height: 0.0,
        },
        absolute: AbsoluteOffset {
            top: 0.0,
            left: 0.0,
        },
    };

    pub fn is_zeroed(&self) -> bool {
        *self == Self::ZEROED
    }
}

/// Position relative to the viewport, as CSS-style percentage labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentagePosition {
    pub from_top: String,
    pub from_left: String,
    pub visible_height: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenPosition {
    pub viewport: BoxMetrics,
    pub absolute: AbsoluteOffset,
    pub percentage: PercentagePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyPositionView {
    pub name: TechName,
    pub position: ElementPosition,
}

/// Window state at the time the snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportView {
    pub width: f64,
    pub height: f64,
    pub scroll_y: f64,
    pub scroll_x: f64,
}

/// One timeline entry currently inside the viewport band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleItemView {
    /// Position among rendered entries (DOM order).
    pub index: usize,
    pub title: String,
    pub year: String,
    pub company: String,
    /// Visible share of the entry inside the band, whole percent.
    pub visibility: u8,
    pub screen_position: ScreenPosition,
    pub technologies: Vec<TechnologyPositionView>,
    pub viewport: ViewportView,
}

impl VisibleItemView {
    /// `"40%"`
    pub fn visibility_label(&self) -> String {
        format!("{}%", self.visibility)
    }
}

/// Entries inside the band, in DOM order.
pub type VisibilitySnapshot = Vec<VisibleItemView>;
