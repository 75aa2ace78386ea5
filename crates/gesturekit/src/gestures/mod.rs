#![forbid(unsafe_code)]

//! Concrete recognizers.

mod long_press;
pub(crate) mod pan;
mod pinch;
mod rotate;
mod scale;
mod screen_edge_pan;
mod swipe;
mod tap;

pub use long_press::LongPress;
pub use pan::Pan;
pub use pinch::Pinch;
pub use rotate::Rotate;
pub use scale::{ScaleDetector, ScaleUpdate};
pub use screen_edge_pan::{RectEdge, ScreenEdgePan, SurfaceSize};
pub use swipe::{Swipe, SwipeDirection};
pub use tap::Tap;
