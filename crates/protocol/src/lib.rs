pub mod capability;
pub mod snapshot;
pub mod tech_name;
pub mod types;

pub use capability::{
    CaptureCallback, CaptureError, CaptureRequest, Capturer, DomTree, ElementId, EventKind,
    Handler, Host, HostEvent, IntersectionEntry, ListenerId, MutationFilter, Observation,
    ScrollBehavior, Scheduler, Selector, Slot, Target, Task, TaskId,
};
pub use snapshot::{
    AbsoluteOffset, BoxMetrics, ElementPosition, PercentagePosition, ScreenPosition,
    TechnologyPositionView, ViewportView, VisibilitySnapshot, VisibleItemView,
};
pub use tech_name::TechName;
pub use types::{Point, Rect, ViewportMetrics};
