//! Domain layer: value types and recording rules.

mod action;
mod action_list;
mod device;
mod flow;
mod geometry;
mod gesture;
mod playback;
mod screenshot;
mod stage;

pub use action::*;
pub use action_list::*;
pub use device::*;
pub use flow::*;
pub use geometry::*;
pub use gesture::*;
pub use playback::*;
pub use screenshot::*;
pub use stage::*;
