//! View state consumed by presentation
//!
//! This module provides:
//! - The dashboard `ViewState` and its token-guarded projector
//! - The predict form state

mod predict;
mod projector;

pub use predict::PredictionPanel;
pub use projector::{Applied, CycleToken, RefreshPhase, ViewProjector, ViewState};
