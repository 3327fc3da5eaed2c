pub mod outcome;
pub mod raster;
pub mod remote_file;

pub use outcome::{FileOutcome, FileReport, RunReport};
pub use raster::{GeoKeys, GeoRaster, GeoTransform, RasterData, Window};
pub use remote_file::{Bookmark, DekadId, RemoteFile};
