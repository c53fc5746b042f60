pub mod coord;
pub mod id;
pub mod math;
pub mod tile;
