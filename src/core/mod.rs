pub mod deep_space;
pub mod frames;
pub mod gravity;
pub mod orbit;
pub mod satellite;
pub mod time;
pub mod tle;
