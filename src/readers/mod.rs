pub mod boundary_reader;
pub mod geotiff_reader;
pub mod listing_reader;

pub use boundary_reader::BoundaryReader;
pub use geotiff_reader::GeoTiffReader;
pub use listing_reader::ListingReader;
