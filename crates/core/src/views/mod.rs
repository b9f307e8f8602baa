pub mod connections;
pub mod minimap;
pub mod progress;
pub mod tech_list;
pub mod timeline;

pub use connections::{ConnectionEngine, ConnectionLine, CurvePath, Highlighter, LineSink};
pub use minimap::{
    CaptureOutcome, CaptureState, DragState, MinimapController, MinimapParts, MinimapState,
    SkipReason, Track,
};
pub use tech_list::TechSelection;
pub use timeline::{VisibilityBand, VisibilityTracker};
