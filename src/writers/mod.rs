pub mod geotiff_writer;

pub use geotiff_writer::GeoTiffWriter;
