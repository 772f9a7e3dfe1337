pub mod accumulator;
pub mod analysis;
pub mod decode;
pub mod pitch;
pub mod progress;
pub mod spectrum;
pub mod stream;
pub mod timeline;
