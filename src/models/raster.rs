use serde::{Deserialize, Serialize};
use std::fmt;

/// North-up affine transform mapping pixel (col, row) to map coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Build from GeoTIFF ModelTiepoint (I, J, K, X, Y, Z) and ModelPixelScale (Sx, Sy, Sz)
    pub fn from_tiepoint(tiepoint: &[f64], scale: &[f64]) -> Option<Self> {
        if tiepoint.len() < 6 || scale.len() < 2 {
            return None;
        }
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        let (sx, sy) = (scale[0], scale[1]);
        if sx == 0.0 || sy == 0.0 {
            return None;
        }

        Some(Self {
            origin_x: x - i * sx,
            origin_y: y + j * sy,
            pixel_width: sx,
            pixel_height: -sy,
        })
    }

    pub fn tiepoint(&self) -> [f64; 6] {
        [0.0, 0.0, 0.0, self.origin_x, self.origin_y, 0.0]
    }

    pub fn pixel_scale(&self) -> [f64; 3] {
        [self.pixel_width, -self.pixel_height, 0.0]
    }

    /// Map coordinates of a fractional pixel position
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }

    /// Fractional pixel position of a map coordinate
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Same grid, origin moved to the top-left corner of `window`
    pub fn shifted(&self, window: &Window) -> Self {
        let (origin_x, origin_y) = self.apply(window.col_off as f64, window.row_off as f64);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }

    /// (min_x, min_y, max_x, max_y) covered by a raster of the given size
    pub fn bounds(&self, width: u32, height: u32) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.apply(0.0, 0.0);
        let (x1, y1) = self.apply(width as f64, height as f64);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "origin=({}, {}), pixel=({}, {})",
            self.origin_x, self.origin_y, self.pixel_width, self.pixel_height
        )
    }
}

/// Pixel-space rectangle inside a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub col_off: u32,
    pub row_off: u32,
    pub width: u32,
    pub height: u32,
}

impl Window {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// GeoTIFF georeferencing keys carried through unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoKeys {
    pub directory: Vec<u16>,
    pub double_params: Option<Vec<f64>>,
    pub ascii_params: Option<String>,
}

/// Single-band sample buffer in row-major order
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl RasterData {
    pub fn len(&self) -> usize {
        match self {
            RasterData::U8(v) => v.len(),
            RasterData::U16(v) => v.len(),
            RasterData::I16(v) => v.len(),
            RasterData::I32(v) => v.len(),
            RasterData::F32(v) => v.len(),
            RasterData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            RasterData::U8(_) => "uint8",
            RasterData::U16(_) => "uint16",
            RasterData::I16(_) => "int16",
            RasterData::I32(_) => "int32",
            RasterData::F32(_) => "float32",
            RasterData::F64(_) => "float64",
        }
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            RasterData::U8(v) => v.iter().map(|&x| x as f64).collect(),
            RasterData::U16(v) => v.iter().map(|&x| x as f64).collect(),
            RasterData::I16(v) => v.iter().map(|&x| x as f64).collect(),
            RasterData::I32(v) => v.iter().map(|&x| x as f64).collect(),
            RasterData::F32(v) => v.iter().map(|&x| x as f64).collect(),
            RasterData::F64(v) => v.clone(),
        }
    }
}

/// A georeferenced single-band raster and the metadata needed to rewrite it
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRaster {
    pub width: u32,
    pub height: u32,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
    pub geo_keys: GeoKeys,
    pub data: RasterData,
}

impl GeoRaster {
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.width, self.height)
    }
}
