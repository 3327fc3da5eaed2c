pub mod clipper;
pub mod pipeline;

pub use clipper::{clip_file, Clipper};
pub use pipeline::Pipeline;
