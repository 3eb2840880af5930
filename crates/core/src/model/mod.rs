pub mod lane;
pub mod overlay;

pub use lane::{AllocPolicy, Lane, LaneTable};
pub use overlay::{Motion, Overlay, OverlayId, OverlayKey, OverlaySpec, glyph_size_for};
