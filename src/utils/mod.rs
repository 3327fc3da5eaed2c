pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{decompressed_name, file_name_from_url};
pub use progress::ProgressReporter;
