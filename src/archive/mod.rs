pub mod gzip;
pub mod temp_manager;

pub use gzip::{decompress_gz, decompress_gz_to};
pub use temp_manager::IntermediateFiles;
