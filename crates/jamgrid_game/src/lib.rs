pub mod completion;
pub mod easing;
pub mod fall;
pub mod mover;
pub mod occupancy;
pub mod persistent;
pub mod selection;
