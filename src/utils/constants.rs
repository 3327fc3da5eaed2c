/// CHIRPS 2.0 Africa dekadal GeoTIFF directory
pub const DEFAULT_BASE_URL: &str = "https://data.chc.ucsb.edu/products/CHIRPS-2.0/africa_dekad/tifs/";

/// Last file considered processed on the reference run
pub const DEFAULT_BOOKMARK: &str = "chirps-v2.0.2003.10.1.tif.gz";

/// File name suffixes
pub const COMPRESSED_SUFFIX: &str = ".tif.gz";
pub const GZIP_SUFFIX: &str = ".gz";

/// Directory names
pub const DOWNLOAD_DIR: &str = "CHIRPS_10_DAY";
pub const EXTRACT_DIR: &str = "CHIRPS_10_DAY/geotiff_files_extended";
pub const OUTPUT_DIR: &str = "CHIRPS_10_DAY/ten_day_cropped_kenya";
pub const BOUNDARY_PATH: &str = "Kenya_Shapefile/kenya.shp";

/// Download defaults
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CHIRPS_ETL";

/// Fill value when a source raster declares no nodata
pub const DEFAULT_FILL_VALUE: f64 = 0.0;

/// GeoTIFF tag codes
pub const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
pub const TAG_MODEL_TIEPOINT: u16 = 33922;
pub const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
pub const TAG_GEO_DOUBLE_PARAMS: u16 = 34736;
pub const TAG_GEO_ASCII_PARAMS: u16 = 34737;
pub const TAG_GDAL_NODATA: u16 = 42113;
