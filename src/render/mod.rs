pub mod canvas;
pub mod keyboard;
pub mod strip;
