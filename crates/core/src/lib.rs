//! View-state core of the folio portfolio page.
//!
//! Everything here runs against the capabilities in `folio_protocol`; the
//! wasm bridge supplies browser implementations and the tests supply
//! `folio_headless`.

pub mod attrs;
pub mod config;
pub mod geometry;
pub mod icons;
pub mod model;
pub mod schedule;
pub mod store;
pub mod svg;
pub mod tech_index;
pub mod views;

pub use config::{ConfigError, FolioConfig};
pub use geometry::{Env, GeometrySampler};
pub use schedule::{FramePass, Subscriptions};
pub use store::{SnapshotWriter, TimelineState, ViewStateStore};
pub use tech_index::TechnologyIndex;
